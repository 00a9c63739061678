//! Halt signals for long-lived server tasks.
use derive_more::Display;
use tokio::sync::oneshot;

/// Reason a service was asked to stop.
#[derive(Copy, Clone, Debug, Display, Default, Eq, PartialEq)]
pub enum Halted {
    #[default]
    #[display("normal")]
    Normal,
}

/// It resolves when the halt channel fires (or its sender is dropped),
/// logging the provided message.
pub async fn shutdown_signal_with_message(rx_halt: oneshot::Receiver<Halted>, message: String) {
    let halt = rx_halt.await;

    tracing::info!("{message} ({halt:?})");
}
