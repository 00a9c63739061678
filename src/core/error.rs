//! The outcome taxonomy shared by all tracker operations.
use thiserror::Error;

use super::databases;

/// Failure outcomes observable at the tracker boundary.
///
/// Each variant maps to exactly one wire tag; the delivery layer owns that
/// mapping and the accompanying human-readable message.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Session capacity or file quota exhausted. Wire tag `FULL`.
    #[error("capacity exhausted")]
    Full,

    /// Uniqueness violation: a live session under the same name, or a file
    /// registered twice. Wire tag `COPY`.
    #[error("duplicate entry")]
    Duplicate,

    /// Token and user name do not match a live session. Wire tag `CRED`.
    #[error("token/username mismatch")]
    Credentials,

    /// Password mismatch on login. Wire tag `PASSWORD`.
    #[error("incorrect password")]
    Password,

    /// No results. Wire tag `404`.
    #[error("no results")]
    NotFound,

    /// Storage failure, including storage unavailability. Wire tag `ERROR`.
    #[error("storage error: {0}")]
    Storage(#[from] databases::error::Error),

    /// Any other internal failure. Wire tag `ERROR`.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OperationError {
    /// `true` for the variants that indicate a fault inside the tracker
    /// rather than a caller mistake; these are the ones worth logging.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Internal(_))
    }
}
