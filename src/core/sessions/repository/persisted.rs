use std::sync::Arc;

use crate::core::databases::{self, Database, UserRecord};

/// The database repository for durable user accounts.
pub struct DatabaseUserRepository {
    database: Arc<Box<dyn Database>>,
}

impl DatabaseUserRepository {
    #[must_use]
    pub fn new(database: &Arc<Box<dyn Database>>) -> Self {
        Self {
            database: database.clone(),
        }
    }

    /// It returns the stored account for `name`, if any.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the lookup fails.
    pub fn fetch(&self, name: &str) -> Result<Option<UserRecord>, databases::error::Error> {
        self.database.fetch_user(name)
    }

    /// It inserts a new account row.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the insert fails.
    pub fn insert(&self, user: &UserRecord) -> Result<(), databases::error::Error> {
        self.database.insert_user(user)
    }

    /// It updates the last known IP of an account.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the update fails.
    pub fn update_ip(&self, name: &str, ip: &str) -> Result<(), databases::error::Error> {
        self.database.update_user_ip(name, ip)
    }

    /// It updates the last known peer listener port of an account.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if the update fails.
    pub fn update_port(&self, name: &str, port: u16) -> Result<(), databases::error::Error> {
        self.database.update_user_port(name, port)
    }
}
