//! The application's long-lived jobs.
//!
//! Each job is an independently spawned task:
//!
//! - The RPC server ([`rpc_server`]), one per tracker process.
//! - The session reaper ([`session_reaper`]), evicting silent peers.
//! - The storage health probe ([`storage_health`]), reconnecting a lost
//!   store.
use std::net::SocketAddr;

pub mod rpc_server;
pub mod session_reaper;
pub mod storage_health;

/// Message sent by a job to report it is ready to serve, carrying the
/// actually bound address (relevant when binding to port 0).
#[derive(Debug)]
pub struct Started {
    pub address: SocketAddr,
}
