//! Fileswarm is a centralized peer-to-peer file index and session tracker,
//! plus the per-peer transport each participant runs to upload files on
//! request.
//!
//! A tracker process maintains the directory of active peers and their
//! registered files; peers consult the tracker to discover hosts, then
//! exchange file bytes directly over a simple request/response socket
//! protocol.
//!
//! ```text
//!   peer A ──RPC──▶ ┌─────────┐ ◀──RPC── peer B
//!                   │ tracker │
//!                   └─────────┘
//!   peer A ◀───────file bytes──────── peer B
//! ```
//!
//! # Table of contents
//!
//! - [Tracker](#tracker)
//! - [Peer transport](#peer-transport)
//! - [Configuration](#configuration)
//!
//! # Tracker
//!
//! The tracker couples two identity surfaces:
//!
//! - The **active peer table** ([`core::sessions`]): an in-memory bounded
//!   map of live sessions, each a `(name, token)` pair with a liveness
//!   stamp refreshed by heartbeats. Sessions die with the process.
//! - The **file index** ([`core::files`]): a durable catalog of
//!   registrations in a relational store ([`core::databases`]), with
//!   per-user quotas and a uniqueness constraint per
//!   `(owner, name, type, path)` tuple.
//!
//! Search and host-lookup answers are filtered by current liveness: only
//! files whose owner is in the active peer table at the moment of the call
//! are returned.
//!
//! The RPC surface ([`servers::rpc`]) exposes nine operations:
//! `connectToServer`, `resumeSession`, `disconnectFromServer`,
//! `sendHeartBeat`, `registerFile`, `deregisterFile`, `getUserFiles`,
//! `searchFile` and `getFileHostInfo`. Every response is an ordered list
//! of strings whose first element is the outcome tag (`OK`, `NEW`,
//! `UPDATE`, `ERROR`, `FULL`, `COPY`, `CRED`, `PASSWORD`, `404`).
//!
//! A background reaper evicts sessions silent for longer than two minutes;
//! a storage health probe silently reconnects a lost database connection.
//!
//! # Peer transport
//!
//! The [`peer`] module implements the direct leg: a listener accepting
//! inbound sockets, a sender streaming file bytes in 1024-byte chunks, and
//! a downloader handling resume-safe local naming, progress reporting and
//! the `HTTP/1.1 404 Not Found` sentinel. Transfers are EOF-delimited and
//! unauthenticated; the tracker only brokers who connects to whom.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! threshold = "info"
//!
//! [storage]
//! driver = "sqlite3"
//! url = "./storage/fileswarm.db"
//!
//! [tracker]
//! bind_address = "0.0.0.0:7070"
//! max_users = 50
//! max_files_per_user = 10
//! ```
//!
//! Refer to [`bootstrap::config`] for all options.
pub mod app;
pub mod bootstrap;
pub mod client;
pub mod container;
pub mod core;
pub mod peer;
pub mod servers;
