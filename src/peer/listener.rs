//! The peer listener: accepts inbound peer sockets on the configured port.
use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::sender;
use crate::servers::signals::Halted;

/// A running accept loop on the peer's configured port.
///
/// Every accepted socket is handed to a new sender task. The listener is a
/// long-lived resource: accept errors are logged and looped over. It stops
/// only on the close signal, after which acceptance ceases.
pub struct PeerListener {
    local_addr: SocketAddr,
    tx_halt: Option<oneshot::Sender<Halted>>,
    task: JoinHandle<()>,
}

impl PeerListener {
    /// It binds to `bind_to` and starts accepting.
    ///
    /// # Errors
    ///
    /// Will return an `io::Error` if the port cannot be bound.
    pub async fn start(bind_to: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(bind_to).await?;
        let local_addr = listener.local_addr()?;

        let (tx_halt, mut rx_halt) = oneshot::channel();

        let task = tokio::spawn(async move {
            tracing::info!("Peer listener started on: {local_addr}");

            loop {
                select! {
                    halted = &mut rx_halt => {
                        tracing::info!("Peer listener on {local_addr} closed ({halted:?})");
                        break;
                    }
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((socket, remote)) => {
                                tokio::spawn(sender::serve(socket, remote));
                            }
                            Err(e) => {
                                tracing::warn!(err = %e, "peer listener accept error");
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            local_addr,
            tx_halt: Some(tx_halt),
            task,
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// It sends the close signal and waits for the accept loop to end.
    pub async fn stop(mut self) {
        if let Some(tx_halt) = self.tx_halt.take() {
            let _ = tx_halt.send(Halted::Normal);
        }

        let _ = self.task.await;
    }
}
