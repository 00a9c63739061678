//! The per-peer transport.
//!
//! Every participant runs a [`listener::PeerListener`] on its configured
//! port. A remote peer that wants a file connects directly, sends one
//! request line, and receives either the raw file bytes (EOF-delimited) or
//! the literal 404 sentinel. The [`downloader`] drives the requesting side;
//! the [`sender`] serves the sending side. The tracker is not involved in
//! this leg at all: it only told the downloader where to connect.
pub mod downloader;
pub mod listener;
pub mod progress;
pub mod protocol;
pub mod sender;
