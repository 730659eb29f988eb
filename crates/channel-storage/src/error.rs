//! Storage layer error types.

use thiserror::Error;

/// Errors returned by the primary store.
///
/// The search layer passes these through to its callers unchanged, so
/// they are `Clone` and comparable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record with the same unique key already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A configured limit would be exceeded
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// Caller supplied an invalid record
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Any other store failure
    #[error("Storage error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
