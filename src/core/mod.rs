//! The core tracker module contains the generic file-index tracker logic
//! which is independent of the delivery layer.
//!
//! It contains the tracker services and their dependencies. It's a domain
//! layer which does not specify how peers connect to the tracker.
//!
//! ```text
//! Delivery layer      Domain layer
//!
//!  Tracker RPC server |> Session manager + File index
//! ```
//!
//! The tracker has three groups of responsibilities:
//!
//! - **Sessions**: login, resume, disconnect and heartbeat; token issuance
//!   and the authentication gate used by every other operation.
//! - **File index**: the durable catalog of registrations, with per-user
//!   quotas and liveness-filtered search and host lookup.
//! - **Persistence**: the gateway to the relational store holding the
//!   `users` and `user_files` tables.
pub mod databases;
pub mod error;
pub mod files;
pub mod sessions;
