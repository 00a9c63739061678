//! Job that starts the tracker RPC server.
//!
//! The spawned task is the "launcher": it binds the socket, reports the
//! bound address back through the start channel and then accepts requests
//! until halted.
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::servers::rpc::launcher::Launcher;
use crate::servers::rpc::processor::Processor;
use crate::servers::signals::Halted;

/// It starts the RPC server job and waits for it to be bound.
///
/// Returns the bound address (useful when `bind_to` has port 0) and the
/// join handle of the accept loop.
///
/// # Panics
///
/// Will panic if the server does not report a bound address.
pub async fn start_job(
    processor: &Arc<Processor>,
    bind_to: SocketAddr,
    rx_halt: oneshot::Receiver<Halted>,
) -> (SocketAddr, JoinHandle<()>) {
    let (tx_start, rx_start) = oneshot::channel();

    let processor = processor.clone();

    let join_handle = tokio::spawn(async move {
        Launcher::run_with_graceful_shutdown(processor, bind_to, tx_start, rx_halt).await;
    });

    let started = rx_start.await.expect("the RPC server should report its bound address");

    (started.address, join_handle)
}
