//! Database driver selection.
use serde::Deserialize;

use super::error::Error;
use super::mysql::MySql;
use super::sqlite::Sqlite3;
use super::Database;

/// The database management systems the tracker can persist to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, derive_more::Display)]
pub enum Driver {
    /// The `SQLite3` driver.
    #[serde(rename = "sqlite3")]
    #[display("sqlite3")]
    Sqlite3,

    /// The `MySQL` driver.
    #[serde(rename = "mysql")]
    #[display("mysql")]
    MySQL,
}

/// It builds a new database driver for the given url.
///
/// For `sqlite3` the url is a filesystem path (or `:memory:`); for `mysql`
/// it is a connection url, with user and password supplied separately so
/// they never appear in logs.
///
/// # Errors
///
/// Will return an [`Error`] if the connection cannot be established.
pub fn build(
    driver: &Driver,
    url: &str,
    user: Option<&str>,
    password: Option<&str>,
) -> Result<Box<dyn Database>, Error> {
    let database: Box<dyn Database> = match driver {
        Driver::Sqlite3 => Box::new(Sqlite3::new(url)?),
        Driver::MySQL => Box::new(MySql::new(url, user, password)?),
    };

    database.setup_schema()?;

    Ok(database)
}
