//! Application entry point. It starts all the tracker jobs.
//!
//! The tracker is a set of independent jobs:
//!
//! - The RPC server, answering the session and file-index operations.
//! - The session reaper, evicting peers that stopped sending heartbeats.
//! - The storage health probe, reconnecting a lost storage connection.
//!
//! Every job runs on its own task. The handles (and the halt senders for
//! the jobs that take one) are returned to the caller, which typically
//! waits for a shutdown signal and then halts and joins them.
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::bootstrap::config::Configuration;
use crate::bootstrap::jobs::{rpc_server, session_reaper, storage_health};
use crate::container::AppContainer;
use crate::servers::signals::Halted;

/// It starts the tracker jobs.
///
/// # Panics
///
/// Will panic if the RPC server cannot bind its address.
pub async fn start(config: &Configuration, app_container: &AppContainer) -> (Vec<JoinHandle<()>>, Vec<oneshot::Sender<Halted>>) {
    let mut jobs = Vec::new();
    let mut halt_senders = Vec::new();

    // Tracker RPC server
    let (tx_halt, rx_halt) = oneshot::channel();
    let (_address, rpc_job) = rpc_server::start_job(&app_container.rpc_processor, config.tracker.bind_address, rx_halt).await;
    jobs.push(rpc_job);
    halt_senders.push(tx_halt);

    // Session reaper
    jobs.push(session_reaper::start_job(&app_container.active_peers));

    // Storage health probe
    jobs.push(storage_health::start_job(&app_container.database));

    (jobs, halt_senders)
}
