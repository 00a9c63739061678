//! Setup for the main tracker application.
//!
//! [`setup`] only builds the application and its dependencies but it does
//! not start it. There is no such thing as a main application process:
//! when the application starts, the only thing it does is starting a bunch
//! of independent jobs. If you are looking for how things are started you
//! should read [`app::start`](crate::app::start).
//!
//! Setup steps:
//!
//! 1. Load and validate the configuration.
//! 2. Initialize logging.
//! 3. Initialize the storage connection and schema.
//! 4. Build the session table, the domain services and the RPC processor.
use std::sync::Arc;

use super::config::{initialize_configuration, Configuration};
use crate::bootstrap;
use crate::container::AppContainer;
use crate::core::databases::setup::initialize_database;
use crate::core::files::repository::persisted::DatabaseFileRepository;
use crate::core::files::FileIndex;
use crate::core::sessions::repository::in_memory::ActivePeerTable;
use crate::core::sessions::repository::persisted::DatabaseUserRepository;
use crate::core::sessions::SessionManager;
use crate::servers::rpc::processor::Processor;

/// It loads the configuration and builds the app container.
///
/// # Panics
///
/// Setup can fail if the configuration is missing or invalid, or if the
/// storage connection cannot be established.
#[must_use]
pub fn setup() -> (Configuration, AppContainer) {
    let configuration = initialize_configuration();

    if let Err(e) = configuration.validate() {
        panic!("Configuration error: {e}");
    }

    bootstrap::logging::setup(&configuration);

    let app_container = initialize_app_container(&configuration);

    (configuration, app_container)
}

/// It builds every component of the tracker and wires them together.
///
/// The active peer table is sized by `max_users` here, before any listener
/// binds, so no request can observe an unconfigured tracker.
///
/// # Panics
///
/// Will panic if the storage connection cannot be established.
#[must_use]
pub fn initialize_app_container(configuration: &Configuration) -> AppContainer {
    let database = initialize_database(configuration);

    let active_peers = Arc::new(ActivePeerTable::new(usize::from(configuration.tracker.max_users)));

    let user_repository = Arc::new(DatabaseUserRepository::new(&database));
    let file_repository = Arc::new(DatabaseFileRepository::new(&database));

    let session_manager = Arc::new(SessionManager::new(&active_peers, &user_repository));
    let file_index = Arc::new(FileIndex::new(
        &active_peers,
        &file_repository,
        configuration.tracker.max_files_per_user,
    ));

    let rpc_processor = Arc::new(Processor::new(&session_manager, &file_index));

    AppContainer {
        database,
        active_peers,
        user_repository,
        file_repository,
        session_manager,
        file_index,
        rpc_processor,
    }
}
