use std::sync::Arc;

use crate::core::databases::Database;
use crate::core::files::repository::persisted::DatabaseFileRepository;
use crate::core::files::FileIndex;
use crate::core::sessions::repository::in_memory::ActivePeerTable;
use crate::core::sessions::repository::persisted::DatabaseUserRepository;
use crate::core::sessions::SessionManager;
use crate::servers::rpc::processor::Processor;

pub struct AppContainer {
    pub database: Arc<Box<dyn Database>>,
    pub active_peers: Arc<ActivePeerTable>,
    pub user_repository: Arc<DatabaseUserRepository>,
    pub file_repository: Arc<DatabaseFileRepository>,
    pub session_manager: Arc<SessionManager>,
    pub file_index: Arc<FileIndex>,
    pub rpc_processor: Arc<Processor>,
}
