//! Job that probes the storage connection and reconnects it on loss.
//!
//! While the store is unreachable, tracker operations keep failing with
//! `ERROR`; the probe re-establishes the connection in the background so
//! the outage ends without operator action. Transitions are logged once
//! per direction, not once per probe.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::databases::Database;

/// How often the connection is tested.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(5);

#[must_use]
pub fn start_job(database: &Arc<Box<dyn Database>>) -> JoinHandle<()> {
    let database = database.clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PROBE_INTERVAL);
        interval.tick().await;

        let mut healthy = true;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Stopping storage health probe job..");
                    break;
                }
                _ = interval.tick() => {
                    match database.probe() {
                        Ok(()) => {
                            if !healthy {
                                tracing::info!("Connection to storage reestablished.");
                                healthy = true;
                            }
                        }
                        Err(e) => {
                            if healthy {
                                tracing::warn!(err = %e, "Lost connection to storage.");
                                healthy = false;
                            }
                        }
                    }
                }
            }
        }
    })
}
