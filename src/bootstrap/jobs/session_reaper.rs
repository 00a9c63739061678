//! Job that runs a task on intervals to evict silent peers.
//!
//! Every [`REAPER_INTERVAL`] the task snapshots the active peer table and
//! silently drops every session whose last heartbeat is older than
//! [`EVICTION_THRESHOLD`]. Eviction touches no durable state: the account
//! and its file registrations stay in storage, the files simply stop
//! surfacing in searches until the owner logs back in.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::sessions::repository::in_memory::ActivePeerTable;

/// How often the reaper wakes up.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(60);

/// Sessions idle for longer than this are evicted.
pub const EVICTION_THRESHOLD: Duration = Duration::from_secs(120);

/// It starts the reaper job with the default interval and threshold.
#[must_use]
pub fn start_job(active_peers: &Arc<ActivePeerTable>) -> JoinHandle<()> {
    start_job_with(active_peers, REAPER_INTERVAL, EVICTION_THRESHOLD)
}

/// It starts the reaper job with explicit timings (tests use short ones).
#[must_use]
pub fn start_job_with(active_peers: &Arc<ActivePeerTable>, interval: Duration, threshold: Duration) -> JoinHandle<()> {
    let weak_active_peers = Arc::downgrade(active_peers);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Stopping session reaper job..");
                    break;
                }
                _ = interval.tick() => {
                    if let Some(active_peers) = weak_active_peers.upgrade() {
                        let evicted = active_peers.remove_stale(threshold);

                        for session in &evicted {
                            tracing::info!(user = session.user_name(), "evicted silent peer");
                        }
                    } else {
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::start_job_with;
    use crate::core::sessions::repository::in_memory::ActivePeerTable;
    use crate::core::sessions::session::Session;
    use crate::core::sessions::token::SessionToken;

    #[tokio::test]
    async fn it_should_evict_a_silent_peer() {
        let active_peers = Arc::new(ActivePeerTable::new(3));
        active_peers.add(Session::new("alice", SessionToken::random())).unwrap();

        let job = start_job_with(&active_peers, Duration::from_millis(20), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(active_peers.is_empty());

        job.abort();
    }

    #[tokio::test]
    async fn it_should_keep_a_peer_within_the_threshold() {
        let active_peers = Arc::new(ActivePeerTable::new(3));
        active_peers.add(Session::new("alice", SessionToken::random())).unwrap();

        let job = start_job_with(&active_peers, Duration::from_millis(20), Duration::from_secs(120));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(active_peers.len(), 1);

        job.abort();
    }

    #[tokio::test]
    async fn it_should_stop_when_the_table_is_dropped() {
        let active_peers = Arc::new(ActivePeerTable::new(3));

        let job = start_job_with(&active_peers, Duration::from_millis(10), Duration::ZERO);

        drop(active_peers);

        tokio::time::timeout(Duration::from_secs(1), job)
            .await
            .expect("the reaper should stop once its table is gone")
            .expect("the reaper task should not panic");
    }
}
