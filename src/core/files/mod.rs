//! The file index.
//!
//! The [`FileIndex`] is the transactional catalog of (user, file)
//! registrations. It enforces the per-user quota and the uniqueness of the
//! `(owner, name, type, path)` tuple, and it answers search and host-lookup
//! queries filtered by current liveness: only files whose owner is present
//! in the active peer table at the moment of the call are returned. That
//! filter is the coupling point between the durable catalog and the
//! ephemeral session state.
pub mod repository;

use std::sync::Arc;

use rand::Rng;
use repository::persisted::DatabaseFileRepository;

use super::databases::FileRecord;
use super::error::OperationError;
use super::sessions::repository::in_memory::ActivePeerTable;
use super::sessions::token::SessionToken;

/// Default per-user cap on registered files.
pub const DEFAULT_MAX_FILES_PER_USER: u64 = 10;

/// File ids are drawn uniformly from `[0, FILE_ID_SPACE)`.
pub const FILE_ID_SPACE: u32 = 1_000_000;

/// A search result row: what a requester is told about someone else's file.
/// The path stays private until a host lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: u32,
    pub name: String,
    pub file_type: String,
    pub size: u64,
}

/// A host able to serve a file, as returned by a host lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub ip: String,
    pub port: u16,
    pub path: String,
}

pub struct FileIndex {
    active_peers: Arc<ActivePeerTable>,
    file_repository: Arc<DatabaseFileRepository>,
    max_files_per_user: u64,
}

impl FileIndex {
    #[must_use]
    pub fn new(
        active_peers: &Arc<ActivePeerTable>,
        file_repository: &Arc<DatabaseFileRepository>,
        max_files_per_user: u64,
    ) -> Self {
        Self {
            active_peers: active_peers.clone(),
            file_repository: file_repository.clone(),
            max_files_per_user,
        }
    }

    /// It registers a file under the authenticated owner, drawing a fresh
    /// random file id.
    ///
    /// The count/exists/insert sequence is not atomic under the coarse
    /// storage lock; the storage-level uniqueness constraint on
    /// `(owner, name, type, path)` is the final arbiter of races.
    ///
    /// # Errors
    ///
    /// - [`OperationError::Credentials`] when `(name, token)` matches no
    ///   live session.
    /// - [`OperationError::Full`] when the owner is at quota.
    /// - [`OperationError::Duplicate`] when the tuple is already present.
    /// - [`OperationError::Storage`] when the store rejects a step.
    pub fn register(
        &self,
        token: &SessionToken,
        name: &str,
        file_name: &str,
        file_type: &str,
        file_path: &str,
        file_size: u64,
    ) -> Result<(), OperationError> {
        self.authorize(name, token)?;

        if self.file_repository.count_for(name)? >= self.max_files_per_user {
            return Err(OperationError::Full);
        }

        if self.file_repository.exists(name, file_name, file_type, file_path)? {
            return Err(OperationError::Duplicate);
        }

        let id = self.pick_file_id()?;

        self.file_repository.insert(&FileRecord {
            id,
            name: file_name.to_string(),
            file_type: file_type.to_string(),
            path: file_path.to_string(),
            size: file_size,
            owner: name.to_string(),
        })?;

        tracing::info!(user = name, file = file_name, id, "file registered");

        Ok(())
    }

    /// It deletes exactly the matching registration of the authenticated
    /// owner.
    ///
    /// # Errors
    ///
    /// - [`OperationError::Credentials`] when `(name, token)` matches no
    ///   live session.
    /// - [`OperationError::Internal`] when no row matched.
    /// - [`OperationError::Storage`] when the delete fails.
    pub fn deregister(
        &self,
        token: &SessionToken,
        name: &str,
        file_name: &str,
        file_type: &str,
        file_path: &str,
    ) -> Result<(), OperationError> {
        self.authorize(name, token)?;

        let removed = self.file_repository.delete(name, file_name, file_type, file_path)?;

        if removed != 1 {
            return Err(OperationError::Internal(format!(
                "expected to remove one registration of {file_name} for {name}, removed {removed}"
            )));
        }

        tracing::info!(user = name, file = file_name, "file deregistered");

        Ok(())
    }

    /// It returns every registration of the authenticated owner.
    ///
    /// # Errors
    ///
    /// - [`OperationError::Credentials`] when `(name, token)` matches no
    ///   live session.
    /// - [`OperationError::NotFound`] when the owner has no files.
    /// - [`OperationError::Storage`] when the query fails.
    pub fn list(&self, token: &SessionToken, name: &str) -> Result<Vec<FileRecord>, OperationError> {
        self.authorize(name, token)?;

        let files = self.file_repository.list_for(name)?;

        if files.is_empty() {
            return Err(OperationError::NotFound);
        }

        Ok(files)
    }

    /// It searches the catalog for `query`, keeping only files whose owner
    /// is live right now and is not the requester.
    ///
    /// # Errors
    ///
    /// - [`OperationError::Credentials`] when `(name, token)` matches no
    ///   live session.
    /// - [`OperationError::NotFound`] when nothing survives the filter.
    /// - [`OperationError::Storage`] when the query fails.
    pub fn search(&self, token: &SessionToken, requester: &str, query: &str) -> Result<Vec<SearchHit>, OperationError> {
        self.authorize(requester, token)?;

        let hits: Vec<SearchHit> = self
            .file_repository
            .search(requester, query)?
            .into_iter()
            .filter(|record| record.owner != requester && self.active_peers.find(&record.owner).is_some())
            .map(|record| SearchHit {
                id: record.id,
                name: record.name,
                file_type: record.file_type,
                size: record.size,
            })
            .collect();

        if hits.is_empty() {
            return Err(OperationError::NotFound);
        }

        Ok(hits)
    }

    /// It resolves the live hosts serving `file_id`, excluding the
    /// requester's own registrations.
    ///
    /// # Errors
    ///
    /// - [`OperationError::Credentials`] when `(name, token)` matches no
    ///   live session.
    /// - [`OperationError::NotFound`] when no live host remains.
    /// - [`OperationError::Storage`] when the query fails.
    pub fn host_lookup(&self, token: &SessionToken, requester: &str, file_id: u32) -> Result<Vec<HostInfo>, OperationError> {
        self.authorize(requester, token)?;

        let hosts: Vec<HostInfo> = self
            .file_repository
            .hosts(file_id, requester)?
            .into_iter()
            .filter(|record| self.active_peers.find(&record.owner).is_some())
            .map(|record| HostInfo {
                ip: record.ip,
                port: record.port,
                path: record.path,
            })
            .collect();

        if hosts.is_empty() {
            return Err(OperationError::NotFound);
        }

        Ok(hosts)
    }

    fn authorize(&self, name: &str, token: &SessionToken) -> Result<(), OperationError> {
        if self.active_peers.verify(name, token) {
            Ok(())
        } else {
            Err(OperationError::Credentials)
        }
    }

    /// Random draw, re-rolled while the candidate id is taken.
    fn pick_file_id(&self) -> Result<u32, OperationError> {
        loop {
            let candidate = rand::thread_rng().gen_range(0..FILE_ID_SPACE);
            if !self.file_repository.id_in_use(candidate)? {
                return Ok(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::repository::persisted::DatabaseFileRepository;
    use super::{FileIndex, FILE_ID_SPACE};
    use crate::core::databases::sqlite::Sqlite3;
    use crate::core::databases::Database;
    use crate::core::error::OperationError;
    use crate::core::sessions::repository::in_memory::ActivePeerTable;
    use crate::core::sessions::session::Session;
    use crate::core::sessions::token::SessionToken;

    fn instantiate_file_index(max_files_per_user: u64) -> (FileIndex, Arc<ActivePeerTable>) {
        let database: Arc<Box<dyn Database>> = Arc::new(Box::new(
            Sqlite3::new(":memory:").expect("it should open an in-memory database"),
        ));
        database.setup_schema().expect("it should create the schema");

        // Owner rows the registrations will reference.
        for (name, ip, port) in [("alice", "10.0.0.1", 1052), ("bob", "10.0.0.2", 1053)] {
            database
                .insert_user(&crate::core::databases::UserRecord {
                    name: name.to_string(),
                    password_hash: "$argon2id$stub".to_string(),
                    ip: ip.to_string(),
                    port,
                })
                .unwrap();
        }

        let active_peers = Arc::new(ActivePeerTable::new(10));
        let file_repository = Arc::new(DatabaseFileRepository::new(&database));

        (FileIndex::new(&active_peers, &file_repository, max_files_per_user), active_peers)
    }

    fn log_in(active_peers: &ActivePeerTable, name: &str) -> SessionToken {
        let token = SessionToken::random();
        active_peers.add(Session::new(name, token.clone())).unwrap();
        token
    }

    #[test]
    fn it_should_register_and_list_a_file() {
        let (index, active_peers) = instantiate_file_index(10);
        let token = log_in(&active_peers, "alice");

        index.register(&token, "alice", "report", "pdf", "/home/a/", 1024).unwrap();

        let files = index.list(&token, "alice").unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "report");
        assert_eq!(files[0].size, 1024);
        assert!(files[0].id < FILE_ID_SPACE);
    }

    #[test]
    fn it_should_reject_an_unauthenticated_request() {
        let (index, _active_peers) = instantiate_file_index(10);

        let outcome = index.register(&SessionToken::from("bogus"), "alice", "report", "pdf", "/home/a/", 1024);

        assert!(matches!(outcome, Err(OperationError::Credentials)));
    }

    #[test]
    fn it_should_enforce_the_per_user_quota() {
        let (index, active_peers) = instantiate_file_index(10);
        let token = log_in(&active_peers, "alice");

        for n in 0..10 {
            index
                .register(&token, "alice", &format!("file{n}"), "pdf", "/home/a/", 1024)
                .unwrap();
        }

        let outcome = index.register(&token, "alice", "file10", "pdf", "/home/a/", 1024);

        assert!(matches!(outcome, Err(OperationError::Full)));
    }

    #[test]
    fn it_should_reject_a_duplicate_registration() {
        let (index, active_peers) = instantiate_file_index(10);
        let token = log_in(&active_peers, "alice");

        index.register(&token, "alice", "report", "pdf", "/home/a/", 1024).unwrap();

        let outcome = index.register(&token, "alice", "report", "pdf", "/home/a/", 1024);

        assert!(matches!(outcome, Err(OperationError::Duplicate)));
    }

    #[test]
    fn it_should_deregister_exactly_the_matching_file() {
        let (index, active_peers) = instantiate_file_index(10);
        let token = log_in(&active_peers, "alice");
        index.register(&token, "alice", "report", "pdf", "/home/a/", 1024).unwrap();

        index.deregister(&token, "alice", "report", "pdf", "/home/a/").unwrap();

        assert!(matches!(index.list(&token, "alice"), Err(OperationError::NotFound)));
    }

    #[test]
    fn it_should_fail_to_deregister_a_file_that_was_never_registered() {
        let (index, active_peers) = instantiate_file_index(10);
        let token = log_in(&active_peers, "alice");

        let outcome = index.deregister(&token, "alice", "ghost", "pdf", "/home/a/");

        assert!(matches!(outcome, Err(OperationError::Internal(_))));
    }

    mod filtering_by_liveness {
        use super::{instantiate_file_index, log_in, OperationError, SessionToken};

        #[test]
        fn it_should_return_only_files_of_live_owners() {
            let (index, active_peers) = instantiate_file_index(10);
            let alice = log_in(&active_peers, "alice");
            let bob = log_in(&active_peers, "bob");

            index.register(&alice, "alice", "report", "pdf", "/home/a/", 1024).unwrap();

            let hits = index.search(&bob, "bob", "report").unwrap();

            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].name, "report");

            // Alice goes away; her file must vanish from search results.
            active_peers.remove("alice", &alice);

            let outcome = index.search(&bob, "bob", "report");

            assert!(matches!(outcome, Err(OperationError::NotFound)));
        }

        #[test]
        fn it_should_never_return_the_requesters_own_files() {
            let (index, active_peers) = instantiate_file_index(10);
            let alice = log_in(&active_peers, "alice");

            index.register(&alice, "alice", "report", "pdf", "/home/a/", 1024).unwrap();

            let outcome = index.search(&alice, "alice", "report");

            assert!(matches!(outcome, Err(OperationError::NotFound)));
        }

        #[test]
        fn it_should_resolve_live_hosts_for_a_file_id() {
            let (index, active_peers) = instantiate_file_index(10);
            let alice = log_in(&active_peers, "alice");
            let bob = log_in(&active_peers, "bob");

            index.register(&alice, "alice", "report", "pdf", "/home/a/", 1024).unwrap();
            let id = index.search(&bob, "bob", "report").unwrap()[0].id;

            let hosts = index.host_lookup(&bob, "bob", id).unwrap();

            assert_eq!(hosts.len(), 1);
            assert_eq!(hosts[0].ip, "10.0.0.1");
            assert_eq!(hosts[0].port, 1052);
            assert_eq!(hosts[0].path, "/home/a/");
        }

        #[test]
        fn it_should_return_not_found_when_every_host_is_offline() {
            let (index, active_peers) = instantiate_file_index(10);
            let alice = log_in(&active_peers, "alice");
            let bob = log_in(&active_peers, "bob");

            index.register(&alice, "alice", "report", "pdf", "/home/a/", 1024).unwrap();
            let id = index.search(&bob, "bob", "report").unwrap()[0].id;

            active_peers.remove("alice", &alice);

            let outcome = index.host_lookup(&bob, "bob", id);

            assert!(matches!(outcome, Err(OperationError::NotFound)));
        }

        #[test]
        fn it_should_reject_a_search_with_a_stale_token() {
            let (index, active_peers) = instantiate_file_index(10);
            let alice = log_in(&active_peers, "alice");
            active_peers.remove("alice", &alice);

            let outcome = index.search(&SessionToken::from("bogus"), "alice", "report");

            assert!(matches!(outcome, Err(OperationError::Credentials)));
        }
    }
}
