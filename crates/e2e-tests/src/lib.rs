//! End-to-end test infrastructure for the channel search layer.
//!
//! Provides a shared TestHarness wiring an in-memory store, real Tantivy
//! engines under a temp directory and the search layer together.

use std::path::PathBuf;
use std::sync::Arc;

use channel_layer::{SearchChannelStore, SearchLayer};
use channel_search::{
    ChannelIndexConfig, EngineCapabilities, EngineHandle, SearchEngineRegistry,
    TantivyChannelEngine,
};
use channel_storage::{ChannelStore, MemoryStore, UserStore};
use channel_types::{Channel, ChannelList, ChannelMember, PropagationSettings, User};

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Primary store, also used as the user store
    pub store: Arc<MemoryStore>,
    pub registry: Arc<SearchEngineRegistry>,
    pub layer: SearchLayer,
}

impl TestHarness {
    /// Create a harness with no engines registered.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(SearchEngineRegistry::new());
        let layer = SearchLayer::new(
            store.clone(),
            store.clone(),
            registry.clone(),
            &PropagationSettings::default(),
        );

        Self {
            _temp_dir: temp_dir,
            store,
            registry,
            layer,
        }
    }

    /// Index directory for the engine called `name`.
    pub fn index_path(&self, name: &str) -> PathBuf {
        self._temp_dir.path().join(name)
    }

    /// Open a Tantivy engine under the temp dir and register it last.
    pub fn add_tantivy(&self, name: &str) -> Arc<TantivyChannelEngine> {
        let engine = Arc::new(
            TantivyChannelEngine::with_config(
                name,
                ChannelIndexConfig::new(self.index_path(name)),
                EngineCapabilities::default(),
            )
            .expect("Failed to open tantivy engine"),
        );
        self.registry.register(engine.clone());
        engine
    }

    /// Register any engine last.
    pub fn add_engine(&self, engine: EngineHandle) {
        self.registry.register(engine);
    }

    /// Channel store with indexing.
    pub fn channels(&self) -> SearchChannelStore {
        self.layer.channel()
    }

    /// Wait for every background index job.
    pub async fn settle(&self) {
        self.layer.drain().await;
    }

    pub async fn seed_user(&self, id: &str, username: &str) -> User {
        self.store
            .save_user(User::new(id, username))
            .await
            .expect("Failed to save user")
    }

    /// Save an open channel through the search layer.
    pub async fn create_open_channel(&self, id: &str, team_id: &str, display_name: &str) -> Channel {
        self.channels()
            .save(open_channel(id, team_id, display_name), 0)
            .await
            .expect("Failed to save channel")
    }

    pub async fn add_member(&self, channel_id: &str, user_id: &str) {
        self.channels()
            .save_member(ChannelMember::new(channel_id, user_id))
            .await
            .expect("Failed to add member");
    }

    pub async fn autocomplete(&self, team_id: &str, term: &str) -> ChannelList {
        self.channels()
            .autocomplete_in_team(team_id, term, false)
            .await
            .expect("Autocomplete failed")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Open channel whose name is derived from its display name.
pub fn open_channel(id: &str, team_id: &str, display_name: &str) -> Channel {
    let name = display_name.to_lowercase().replace(' ', "-");
    Channel::open(team_id, name)
        .with_id(id)
        .with_display_name(display_name)
}

/// Ids of `channels`, in order.
pub fn channel_ids(channels: &ChannelList) -> Vec<String> {
    channels.iter().map(|c| c.id.clone()).collect()
}

/// Sorted ids of `channels`.
pub fn sorted_ids(channels: &ChannelList) -> Vec<String> {
    let mut ids = channel_ids(channels);
    ids.sort();
    ids
}
