use std::sync::Arc;

use crate::core::databases::{self, Database, FileRecord, HostRecord};

/// The database repository for the durable file catalog.
pub struct DatabaseFileRepository {
    database: Arc<Box<dyn Database>>,
}

impl DatabaseFileRepository {
    #[must_use]
    pub fn new(database: &Arc<Box<dyn Database>>) -> Self {
        Self {
            database: database.clone(),
        }
    }

    /// It counts the registrations owned by `owner`.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the count fails.
    pub fn count_for(&self, owner: &str) -> Result<u64, databases::error::Error> {
        self.database.count_files(owner)
    }

    /// It checks whether the exact `(owner, name, type, path)` tuple is
    /// already registered.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the lookup fails.
    pub fn exists(&self, owner: &str, name: &str, file_type: &str, path: &str) -> Result<bool, databases::error::Error> {
        self.database.file_exists(owner, name, file_type, path)
    }

    /// It checks whether a candidate file id is already taken.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the lookup fails.
    pub fn id_in_use(&self, id: u32) -> Result<bool, databases::error::Error> {
        self.database.file_id_in_use(id)
    }

    /// It inserts a registration row.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the insert fails.
    pub fn insert(&self, file: &FileRecord) -> Result<(), databases::error::Error> {
        self.database.insert_file(file)
    }

    /// It deletes the exact matching registration, returning how many rows
    /// were removed.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the delete fails.
    pub fn delete(&self, owner: &str, name: &str, file_type: &str, path: &str) -> Result<u64, databases::error::Error> {
        self.database.delete_file(owner, name, file_type, path)
    }

    /// It lists the registrations owned by `owner`.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the query fails.
    pub fn list_for(&self, owner: &str) -> Result<Vec<FileRecord>, databases::error::Error> {
        self.database.files_of(owner)
    }

    /// It runs the catalog substring search, excluding `excluded_owner`.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the query fails.
    pub fn search(&self, excluded_owner: &str, query: &str) -> Result<Vec<FileRecord>, databases::error::Error> {
        self.database.search_files(excluded_owner, query)
    }

    /// It resolves the hosts registered for `file_id`, excluding
    /// `excluded_owner`.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the query fails.
    pub fn hosts(&self, file_id: u32, excluded_owner: &str) -> Result<Vec<HostRecord>, databases::error::Error> {
        self.database.hosts_of(file_id, excluded_owner)
    }
}
