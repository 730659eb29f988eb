//! Search engine contract.
//!
//! Every engine variant implements [`SearchEngine`]; the registry and
//! the layers above only ever hold `Arc<dyn SearchEngine>`.

use std::sync::Arc;

use async_trait::async_trait;

use channel_types::{Channel, User};

use crate::capability::EngineCapabilities;
use crate::error::EngineError;

/// Shared handle to an engine. Not owned by the search layer.
pub type EngineHandle = Arc<dyn SearchEngine>;

/// A pluggable search backend.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Engine name for logging and capability reloads.
    fn name(&self) -> &str;

    /// Runtime capability flags.
    fn capabilities(&self) -> &EngineCapabilities;

    fn is_indexing_enabled(&self) -> bool {
        self.capabilities().indexing_enabled()
    }

    fn is_autocomplete_enabled(&self) -> bool {
        self.capabilities().autocomplete_enabled()
    }

    /// Add or replace a channel document.
    async fn index_channel(&self, channel: &Channel) -> Result<(), EngineError>;

    /// Remove a channel document.
    async fn delete_channel(&self, channel: &Channel) -> Result<(), EngineError>;

    /// Add or replace a user document with the user's channel associations.
    async fn index_user(&self, user: &User, channel_ids: &[String]) -> Result<(), EngineError>;

    /// Ids of channels in `team_id` matching `term`, best match first.
    async fn search_channels(&self, team_id: &str, term: &str)
        -> Result<Vec<String>, EngineError>;
}
