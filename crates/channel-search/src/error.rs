//! Search engine error types.

use thiserror::Error;

/// Errors that can occur inside a search engine.
///
/// These never reach callers of store mutations: the indexing path logs
/// them and the query path falls back to the next engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Index writer lock poisoned or held elsewhere
    #[error("Index is locked: {0}")]
    IndexLocked(String),

    /// Capability switched off for this engine
    #[error("Engine {engine} has {capability} disabled")]
    Disabled {
        engine: String,
        capability: &'static str,
    },

    /// Engine reachable but refused the operation
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    /// Background task running the operation failed
    #[error("Task error: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::Task(err.to_string())
    }
}
