//! Root of the search layer.
//!
//! [`SearchLayer`] ties the primary stores to the engine registry and
//! owns the index propagator. Entity stores obtained from it share the
//! same propagator, so [`SearchLayer::drain`] covers every job they spawn.

use std::sync::Arc;

use tracing::{debug, error};

use channel_indexing::{
    IndexOperation, IndexPropagator, IndexSubject, PropagationMetricsSnapshot,
};
use channel_search::SearchEngineRegistry;
use channel_storage::{ChannelStore, UserStore};
use channel_types::{PropagationSettings, User};

use crate::channel_store::SearchChannelStore;

/// Search layer over a channel store and a user store.
#[derive(Clone)]
pub struct SearchLayer {
    channels: Arc<dyn ChannelStore>,
    users: Arc<dyn UserStore>,
    registry: Arc<SearchEngineRegistry>,
    propagator: Arc<IndexPropagator>,
}

impl SearchLayer {
    pub fn new(
        channels: Arc<dyn ChannelStore>,
        users: Arc<dyn UserStore>,
        registry: Arc<SearchEngineRegistry>,
        settings: &PropagationSettings,
    ) -> Self {
        let propagator = Arc::new(IndexPropagator::new(
            Arc::clone(&registry),
            settings.max_concurrent_jobs,
        ));
        Self {
            channels,
            users,
            registry,
            propagator,
        }
    }

    /// Channel store with indexing and engine-backed autocomplete.
    pub fn channel(&self) -> SearchChannelStore {
        SearchChannelStore::new(self.clone())
    }

    pub fn registry(&self) -> &Arc<SearchEngineRegistry> {
        &self.registry
    }

    pub fn propagator(&self) -> &Arc<IndexPropagator> {
        &self.propagator
    }

    pub(crate) fn channels(&self) -> &Arc<dyn ChannelStore> {
        &self.channels
    }

    pub(crate) fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Re-index a user with the channels the user currently belongs to.
    ///
    /// Lookup failures are logged and swallowed.
    pub async fn index_user(&self, user: &User) {
        let channel_ids = match self.channels.get_channel_ids_for_user(&user.id).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(user_id = %user.id, error = %e, "Failed to list channels for user, skipping user index");
                return;
            }
        };
        debug!(user_id = %user.id, channels = channel_ids.len(), "Propagating user index");
        self.propagator
            .propagate(IndexSubject::user(user.clone(), channel_ids), IndexOperation::Index);
    }

    /// Fetch a user by id and re-index it.
    pub async fn index_user_from_id(&self, user_id: &str) {
        match self.users.get_user(user_id).await {
            Ok(user) => self.index_user(&user).await,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to fetch user, skipping user index");
            }
        }
    }

    /// Wait for every index job spawned so far.
    pub async fn drain(&self) {
        self.propagator.drain().await;
    }

    pub fn metrics(&self) -> PropagationMetricsSnapshot {
        self.propagator.metrics()
    }
}
