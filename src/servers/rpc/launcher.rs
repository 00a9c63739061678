//! The tracker RPC server launcher.
use std::net::SocketAddr;
use std::sync::Arc;

use derive_more::Constructor;
use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::oneshot;

use super::processor::Processor;
use super::RPC_LOG_TARGET;
use crate::bootstrap::jobs::Started;
use crate::servers::signals::Halted;

/// A tracker RPC server instance launcher.
#[derive(Constructor)]
pub struct Launcher;

impl Launcher {
    /// It starts the RPC server with graceful shutdown.
    ///
    /// Each accepted connection is served on its own task. Accept errors
    /// are logged and the loop continues; only the halt signal stops
    /// acceptance.
    ///
    /// # Panics
    ///
    /// It panics if unable to bind to the tcp socket or to send the bound
    /// address back to the caller.
    pub async fn run_with_graceful_shutdown(
        processor: Arc<Processor>,
        bind_to: SocketAddr,
        tx_start: oneshot::Sender<Started>,
        mut rx_halt: oneshot::Receiver<Halted>,
    ) {
        tracing::info!(target: RPC_LOG_TARGET, "Starting on: {bind_to}");

        let listener = TcpListener::bind(bind_to)
            .await
            .expect("it should be able to bind the rpc listener socket");

        let address = listener
            .local_addr()
            .expect("it should be able to get the bound address from the rpc listener");

        tracing::info!(target: RPC_LOG_TARGET, "Started on: {address}");

        tx_start
            .send(Started { address })
            .expect("the RPC server service should not be dropped");

        loop {
            select! {
                halted = &mut rx_halt => {
                    tracing::info!(target: RPC_LOG_TARGET, "Halting RPC server bound to: {address} ({halted:?})");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, remote)) => {
                            let processor = processor.clone();
                            tokio::spawn(async move {
                                processor.process(stream, remote).await;
                            });
                        }
                        Err(e) => {
                            // The listener is a long-lived resource; a
                            // failed accept is not terminal.
                            tracing::warn!(target: RPC_LOG_TARGET, err = %e, "accept error");
                        }
                    }
                }
            }
        }
    }
}
