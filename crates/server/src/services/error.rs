//! Errors from list and item operations.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur in list, item and sharing operations.
#[derive(Debug, Error)]
pub enum GroceryError {
    /// The user may not perform this action on the list.
    #[error("permission denied")]
    PermissionDenied,

    /// The named entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl GroceryError {
    /// Map a repository `NotFound` to `GroceryError::NotFound(what)`.
    pub(crate) fn or_not_found(err: RepositoryError, what: &'static str) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound(what),
            other => Self::Repository(other),
        }
    }
}
