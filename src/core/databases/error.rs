//! Error types for the persistence gateway.
use thiserror::Error;

use super::driver::Driver;

/// Error returned by a database driver.
#[derive(Error, Debug)]
pub enum Error {
    /// The store could not be reached. Operations issued while the
    /// connection is down fail with this variant; the health probe
    /// re-establishes the connection in the background.
    #[error("the {driver} storage is unreachable: {message}")]
    StorageUnavailable { driver: Driver, message: String },

    /// A statement failed after reaching the store.
    #[error("the {driver} query failed: {message}")]
    Query { driver: Driver, message: String },

    /// An update that must affect exactly one row affected none.
    #[error("the {driver} update matched no row")]
    NoRowAffected { driver: Driver },

    /// The storage url could not be understood by the driver.
    #[error("invalid storage url: {message}")]
    InvalidUrl { message: String },
}

impl Error {
    pub fn unavailable(driver: Driver, source: &dyn std::fmt::Display) -> Self {
        Self::StorageUnavailable {
            driver,
            message: source.to_string(),
        }
    }

    pub fn query(driver: Driver, source: &dyn std::fmt::Display) -> Self {
        Self::Query {
            driver,
            message: source.to_string(),
        }
    }
}
