//! The persistence gateway.
//!
//! This module holds the [`Database`] trait and the records it moves. The
//! tracker keeps two durable tables:
//!
//! - `users`: one row per account that has ever logged in. The password
//!   column stores an argon2 verifier, never the password itself.
//! - `user_files`: the catalog of registered files, one row per
//!   registration, owned by a user.
//!
//! There are two driver implementations behind the trait:
//!
//! - [`sqlite::Sqlite3`]
//! - [`mysql::MySql`]
//!
//! Both drivers serialize access through a single mutex-guarded connection,
//! so at most one query or update is in flight at a time. Every statement
//! uses bound parameters; caller-supplied strings never reach the SQL text.
pub mod driver;
pub mod error;
pub mod mysql;
pub mod setup;
pub mod sqlite;

use self::error::Error;

/// A durable user account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    /// Argon2 verifier in PHC string format.
    pub password_hash: String,
    /// Last known IP address, as reported on login.
    pub ip: String,
    /// Last known peer listener port.
    pub port: u16,
}

/// A durable file registration row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Catalog-wide unique identifier in `[0, 1_000_000)`.
    pub id: u32,
    pub name: String,
    pub file_type: String,
    /// Directory on the owner's filesystem where the file lives.
    pub path: String,
    pub size: u64,
    pub owner: String,
}

/// A host that can serve a given file, as resolved by a host lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub owner: String,
    pub ip: String,
    pub port: u16,
    pub path: String,
}

/// The persistence gateway contract.
///
/// Implementations must serialize all operations against one another:
/// concurrent callers observe the effect of preceding operations.
pub trait Database: Sync + Send {
    /// It creates the `users` and `user_files` tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the schema statements fail.
    fn setup_schema(&self) -> Result<(), Error>;

    /// It checks that the backing store is reachable, re-establishing the
    /// connection if it was lost.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the store cannot be reached.
    fn probe(&self) -> Result<(), Error>;

    /// It returns the user row for `name`, if one exists.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the query fails.
    fn fetch_user(&self, name: &str) -> Result<Option<UserRecord>, Error>;

    /// It inserts a new user row.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the insert fails, for example when the
    /// name is already taken.
    fn insert_user(&self, user: &UserRecord) -> Result<(), Error>;

    /// It updates the last known IP of a user.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the update fails or matches no row.
    fn update_user_ip(&self, name: &str, ip: &str) -> Result<(), Error>;

    /// It updates the last known peer listener port of a user.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the update fails or matches no row.
    fn update_user_port(&self, name: &str, port: u16) -> Result<(), Error>;

    /// It counts the file registrations owned by `owner`.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the query fails.
    fn count_files(&self, owner: &str) -> Result<u64, Error>;

    /// It checks whether `(owner, name, type, path)` is already registered.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the query fails.
    fn file_exists(&self, owner: &str, name: &str, file_type: &str, path: &str) -> Result<bool, Error>;

    /// It checks whether a file id is already taken by a live row.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the query fails.
    fn file_id_in_use(&self, id: u32) -> Result<bool, Error>;

    /// It inserts a new file registration row.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the insert fails, for example when the
    /// `(owner, name, type, path)` uniqueness constraint rejects it.
    fn insert_file(&self, file: &FileRecord) -> Result<(), Error>;

    /// It deletes the row matching `(owner, name, type, path)` exactly and
    /// returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the delete fails.
    fn delete_file(&self, owner: &str, name: &str, file_type: &str, path: &str) -> Result<u64, Error>;

    /// It returns all file registrations owned by `owner`.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the query fails.
    fn files_of(&self, owner: &str) -> Result<Vec<FileRecord>, Error>;

    /// It returns the registrations whose `name ∥ type` contains `query`
    /// (case-insensitive), excluding rows owned by `excluded_owner`.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the query fails.
    fn search_files(&self, excluded_owner: &str, query: &str) -> Result<Vec<FileRecord>, Error>;

    /// It returns the hosts registered for `file_id`, excluding
    /// `excluded_owner`, joining each owner row for its ip and port.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the query fails.
    fn hosts_of(&self, file_id: u32, excluded_owner: &str) -> Result<Vec<HostRecord>, Error>;
}
