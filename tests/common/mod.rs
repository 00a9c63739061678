//! Shared environment for the integration tests.
//!
//! Each test starts its own tracker instance: an ephemeral in-memory
//! database and the RPC server bound to a free localhost port.
use std::net::SocketAddr;

use fileswarm::bootstrap::app::initialize_app_container;
use fileswarm::bootstrap::config::Configuration;
use fileswarm::bootstrap::jobs::rpc_server;
use fileswarm::client::TrackerClient;
use fileswarm::container::AppContainer;
use fileswarm::servers::signals::Halted;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub struct Environment {
    pub client: TrackerClient,
    #[allow(dead_code)]
    pub bind_address: SocketAddr,
    #[allow(dead_code)]
    pub container: AppContainer,
    tx_halt: oneshot::Sender<Halted>,
    job: JoinHandle<()>,
}

/// It starts a tracker with the given session capacity.
pub async fn started_tracker(max_users: u8) -> Environment {
    let mut configuration = Configuration::ephemeral();
    configuration.tracker.max_users = max_users;

    let container = initialize_app_container(&configuration);

    let (tx_halt, rx_halt) = oneshot::channel();

    let (bind_address, job) =
        rpc_server::start_job(&container.rpc_processor, configuration.tracker.bind_address, rx_halt).await;

    Environment {
        client: TrackerClient::new(bind_address),
        bind_address,
        container,
        tx_halt,
        job,
    }
}

impl Environment {
    pub async fn stop(self) {
        let _ = self.tx_halt.send(Halted::Normal);
        let _ = self.job.await;
    }
}
