//! Index jobs.
//!
//! A job is one (subject, operation, engine) triple. It has no persisted
//! identity: if it is lost it is never retried.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use channel_search::{EngineError, EngineHandle};
use channel_types::{Channel, User};

/// What a job does to the engine's copy of the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOperation {
    Index,
    Delete,
}

impl IndexOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexOperation::Index => "index",
            IndexOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for IndexOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a job is about.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSubject {
    /// A channel snapshot
    Channel(Channel),
    /// A user profile plus the ids of the channels the user belongs to
    User { user: User, channel_ids: Vec<String> },
}

impl IndexSubject {
    pub fn user(user: User, channel_ids: Vec<String>) -> Self {
        IndexSubject::User { user, channel_ids }
    }

    /// Entity kind for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            IndexSubject::Channel(_) => "channel",
            IndexSubject::User { .. } => "user",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            IndexSubject::Channel(channel) => &channel.id,
            IndexSubject::User { user, .. } => &user.id,
        }
    }

    /// Channels must be globally discoverable. Users are always eligible.
    pub fn is_indexable(&self) -> bool {
        match self {
            IndexSubject::Channel(channel) => channel.is_globally_discoverable(),
            IndexSubject::User { .. } => true,
        }
    }
}

/// One unit of propagation work against one engine.
pub struct IndexJob {
    subject: Arc<IndexSubject>,
    operation: IndexOperation,
    engine: EngineHandle,
}

impl IndexJob {
    pub fn new(subject: Arc<IndexSubject>, operation: IndexOperation, engine: EngineHandle) -> Self {
        Self {
            subject,
            operation,
            engine,
        }
    }

    pub fn subject(&self) -> &IndexSubject {
        &self.subject
    }

    pub fn operation(&self) -> IndexOperation {
        self.operation
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Invoke the engine call matching the subject and operation.
    pub async fn run(&self) -> Result<(), EngineError> {
        match (self.subject.as_ref(), self.operation) {
            (IndexSubject::Channel(channel), IndexOperation::Index) => {
                self.engine.index_channel(channel).await
            }
            (IndexSubject::Channel(channel), IndexOperation::Delete) => {
                self.engine.delete_channel(channel).await
            }
            (IndexSubject::User { user, channel_ids }, IndexOperation::Index) => {
                self.engine.index_user(user, channel_ids).await
            }
            // User documents are only ever replaced
            (IndexSubject::User { .. }, IndexOperation::Delete) => Err(EngineError::Unavailable(
                "user documents cannot be deleted".to_string(),
            )),
        }
    }
}
