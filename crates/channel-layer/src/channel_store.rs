//! Channel store with search indexing.
//!
//! [`SearchChannelStore`] implements [`ChannelStore`] by delegating to the
//! primary store. Successful mutations additionally trigger index work;
//! failed ones return the store error untouched and trigger nothing.
//! Autocomplete is answered by the first willing engine, or natively by
//! the store when no engine answers.

use async_trait::async_trait;
use tracing::{debug, error, warn};

use channel_indexing::{IndexOperation, IndexSubject};
use channel_search::EngineCapability;
use channel_storage::{ChannelStore, StoreError};
use channel_types::{AutocompleteOptions, Channel, ChannelList, ChannelMember, User};

use crate::layer::SearchLayer;
use crate::resolver::ResultResolver;
use crate::router::QueryRouter;

pub struct SearchChannelStore {
    layer: SearchLayer,
    router: QueryRouter,
    resolver: ResultResolver,
}

impl SearchChannelStore {
    pub fn new(layer: SearchLayer) -> Self {
        let router = QueryRouter::new(layer.registry().clone());
        let resolver = ResultResolver::new(layer.channels().clone());
        Self {
            layer,
            router,
            resolver,
        }
    }

    fn inner(&self) -> &dyn ChannelStore {
        self.layer.channels().as_ref()
    }

    fn index_channel(&self, channel: &Channel) {
        self.layer
            .propagator()
            .propagate(IndexSubject::Channel(channel.clone()), IndexOperation::Index);
    }

    fn delete_channel_index(&self, channel: Channel) {
        self.layer
            .propagator()
            .propagate(IndexSubject::Channel(channel), IndexOperation::Delete);
    }
}

#[async_trait]
impl ChannelStore for SearchChannelStore {
    async fn save(
        &self,
        channel: Channel,
        max_channels_per_team: i64,
    ) -> Result<Channel, StoreError> {
        let channel = self.inner().save(channel, max_channels_per_team).await?;
        self.index_channel(&channel);
        Ok(channel)
    }

    async fn update(&self, channel: Channel) -> Result<Channel, StoreError> {
        let channel = self.inner().update(channel).await?;
        self.index_channel(&channel);
        Ok(channel)
    }

    async fn get(&self, channel_id: &str, allow_from_cache: bool) -> Result<Channel, StoreError> {
        self.inner().get(channel_id, allow_from_cache).await
    }

    async fn get_channels_by_ids(&self, channel_ids: &[String]) -> Result<Vec<Channel>, StoreError> {
        self.inner().get_channels_by_ids(channel_ids).await
    }

    async fn save_member(&self, member: ChannelMember) -> Result<ChannelMember, StoreError> {
        let member = self.inner().save_member(member).await?;
        self.layer.index_user_from_id(&member.user_id).await;
        Ok(member)
    }

    async fn remove_member(&self, channel_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.inner().remove_member(channel_id, user_id).await?;
        self.layer.index_user_from_id(user_id).await;
        Ok(())
    }

    async fn get_members(&self, channel_id: &str) -> Result<Vec<ChannelMember>, StoreError> {
        self.inner().get_members(channel_id).await
    }

    async fn get_channel_ids_for_user(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        self.inner().get_channel_ids_for_user(user_id).await
    }

    async fn create_direct_channel(
        &self,
        user: &User,
        other_user: &User,
    ) -> Result<Channel, StoreError> {
        let channel = self.inner().create_direct_channel(user, other_user).await?;
        self.layer.index_user_from_id(&user.id).await;
        self.layer.index_user_from_id(&other_user.id).await;
        Ok(channel)
    }

    async fn autocomplete_in_team(
        &self,
        team_id: &str,
        term: &str,
        include_deleted: bool,
    ) -> Result<ChannelList, StoreError> {
        let routed = self
            .router
            .route(EngineCapability::Autocomplete, |engine| async move {
                engine.search_channels(team_id, term).await
            })
            .await;

        match routed {
            Some(routed) => {
                debug!(engine = %routed.engine, team_id = %team_id, results = routed.value.len(), "Autocomplete answered by engine");
                let options = AutocompleteOptions::new().with_include_deleted(include_deleted);
                self.resolver.resolve(&routed.value, &options).await
            }
            None => {
                self.inner()
                    .autocomplete_in_team(team_id, term, include_deleted)
                    .await
            }
        }
    }

    async fn permanent_delete_members_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<(), StoreError> {
        // Members are gone after the delete, so the profiles are taken first.
        let profiles = match self
            .layer
            .users()
            .get_all_profiles_in_channel(channel_id, false)
            .await
        {
            Ok(profiles) => profiles,
            Err(e) => {
                error!(channel_id = %channel_id, error = %e, "Failed to list channel members, members will not be re-indexed");
                Vec::new()
            }
        };

        self.inner()
            .permanent_delete_members_by_channel(channel_id)
            .await?;

        for user in &profiles {
            self.layer.index_user(user).await;
        }
        Ok(())
    }

    async fn permanent_delete(&self, channel_id: &str) -> Result<(), StoreError> {
        let snapshot = match self.inner().get(channel_id, true).await {
            Ok(channel) => Some(channel),
            Err(e) => {
                warn!(channel_id = %channel_id, error = %e, "Failed to fetch channel before delete, index will not be cleaned");
                None
            }
        };

        self.inner().permanent_delete(channel_id).await?;

        if let Some(channel) = snapshot {
            self.delete_channel_index(channel);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use channel_search::mock::{EngineCall, RecordingEngine};
    use channel_search::{EngineHandle, SearchEngineRegistry};
    use channel_storage::{MemoryStore, UserStore};
    use channel_types::PropagationSettings;

    struct Fixture {
        store: Arc<MemoryStore>,
        layer: SearchLayer,
        channels: SearchChannelStore,
    }

    fn fixture(engines: Vec<Arc<RecordingEngine>>) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<EngineHandle> = engines.into_iter().map(|e| e as EngineHandle).collect();
        let layer = SearchLayer::new(
            store.clone(),
            store.clone(),
            Arc::new(SearchEngineRegistry::with_engines(handles)),
            &PropagationSettings::default(),
        );
        let channels = layer.channel();
        Fixture {
            store,
            layer,
            channels,
        }
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn channel_ids(channels: &ChannelList) -> Vec<&str> {
        channels.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_save_indexes_on_enabled_engines_only() {
        let on = Arc::new(RecordingEngine::new("on"));
        let off = Arc::new(RecordingEngine::new("off").with_capabilities(false, true));
        let f = fixture(vec![on.clone(), off.clone()]);

        let saved = f
            .channels
            .save(Channel::open("team-1", "town-square"), 0)
            .await
            .unwrap();
        f.layer.drain().await;

        assert_eq!(on.calls(), vec![EngineCall::IndexChannel(saved.id)]);
        assert!(off.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_indexes_fresh_channel() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);

        let saved = f
            .channels
            .save(Channel::open("team-1", "town-square"), 0)
            .await
            .unwrap();
        f.channels
            .update(saved.clone().with_display_name("Town Hall"))
            .await
            .unwrap();
        f.layer.drain().await;

        assert_eq!(engine.index_channel_calls(), vec![saved.id.clone(), saved.id]);
    }

    #[tokio::test]
    async fn test_private_channel_never_indexed() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);

        f.channels
            .save(Channel::private("team-1", "secret"), 0)
            .await
            .unwrap();
        f.layer.drain().await;

        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_mutation_triggers_nothing() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);
        f.store.fail_operation("save");

        let err = f
            .channels
            .save(Channel::open("team-1", "town-square"), 0)
            .await
            .unwrap_err();
        f.layer.drain().await;

        assert_eq!(err, StoreError::Internal("save failed".to_string()));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_store_error_returned_unchanged() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);

        let err = f
            .channels
            .update(Channel::open("team-1", "ghost").with_id("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_indexing_failure_does_not_fail_mutation() {
        let failing = Arc::new(RecordingEngine::new("failing").with_indexing_failure());
        let f = fixture(vec![failing.clone()]);

        let saved = f
            .channels
            .save(Channel::open("team-1", "town-square"), 0)
            .await;
        f.layer.drain().await;

        assert!(saved.is_ok());
        assert_eq!(f.layer.metrics().failed, 1);
    }

    #[tokio::test]
    async fn test_save_member_reindexes_member() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);
        f.store.save_user(User::new("u1", "alice")).await.unwrap();
        let channel = f
            .store
            .save(Channel::open("team-1", "town-square").with_id("c1"), 0)
            .await
            .unwrap();

        f.channels
            .save_member(ChannelMember::new(channel.id.clone(), "u1"))
            .await
            .unwrap();
        f.layer.drain().await;

        assert_eq!(
            engine.calls(),
            vec![EngineCall::IndexUser {
                user_id: "u1".to_string(),
                channel_ids: ids(&["c1"]),
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_save_member_reindexes_nobody() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);
        f.store.save_user(User::new("u1", "alice")).await.unwrap();

        let err = f
            .channels
            .save_member(ChannelMember::new("missing", "u1"))
            .await
            .unwrap_err();
        f.layer.drain().await;

        assert!(err.is_not_found());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_member_reindexes_user_not_channel() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);
        f.store.save_user(User::new("u1", "alice")).await.unwrap();
        f.store
            .save(Channel::open("team-1", "town-square").with_id("c1"), 0)
            .await
            .unwrap();
        f.store.save_member(ChannelMember::new("c1", "u1")).await.unwrap();

        f.channels.remove_member("c1", "u1").await.unwrap();
        f.layer.drain().await;

        assert_eq!(
            engine.calls(),
            vec![EngineCall::IndexUser {
                user_id: "u1".to_string(),
                channel_ids: vec![],
            }]
        );
        assert!(engine.index_channel_calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_direct_channel_reindexes_both_users() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);
        let alice = User::new("u1", "alice");
        let bob = User::new("u2", "bob");
        f.store.save_user(alice.clone()).await.unwrap();
        f.store.save_user(bob.clone()).await.unwrap();

        let channel = f.channels.create_direct_channel(&alice, &bob).await.unwrap();
        f.layer.drain().await;

        let mut users = engine.index_user_calls();
        users.sort();
        assert_eq!(users, ids(&["u1", "u2"]));
        assert!(engine.index_channel_calls().is_empty());
        assert!(engine.calls().contains(&EngineCall::IndexUser {
            user_id: "u1".to_string(),
            channel_ids: vec![channel.id.clone()],
        }));
    }

    #[tokio::test]
    async fn test_create_direct_channel_skips_unknown_user() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);
        let alice = User::new("u1", "alice");
        f.store.save_user(alice.clone()).await.unwrap();

        f.channels
            .create_direct_channel(&alice, &User::new("ghost", "ghost"))
            .await
            .unwrap();
        f.layer.drain().await;

        assert_eq!(engine.index_user_calls(), ids(&["u1"]));
    }

    #[tokio::test]
    async fn test_permanent_delete_uses_snapshot() {
        let on = Arc::new(RecordingEngine::new("on"));
        let off = Arc::new(RecordingEngine::new("off").with_capabilities(false, true));
        let f = fixture(vec![on.clone(), off.clone()]);
        f.store
            .save(Channel::open("team-1", "town-square").with_id("c1"), 0)
            .await
            .unwrap();

        f.channels.permanent_delete("c1").await.unwrap();
        f.layer.drain().await;

        assert_eq!(on.calls(), vec![EngineCall::DeleteChannel("c1".to_string())]);
        assert!(off.calls().is_empty());
        assert!(f.store.get("c1", false).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_permanent_delete_without_snapshot_still_deletes() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);
        f.store
            .save(Channel::open("team-1", "town-square").with_id("c1"), 0)
            .await
            .unwrap();
        f.store.fail_operation("get");

        f.channels.permanent_delete("c1").await.unwrap();
        f.layer.drain().await;

        assert_eq!(f.store.channel_count(), 0);
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_member_delete_reindexes_each_member() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);
        for (id, name) in [("u1", "alice"), ("u2", "bob")] {
            f.store.save_user(User::new(id, name)).await.unwrap();
        }
        f.store
            .save(Channel::open("team-1", "town-square").with_id("c1"), 0)
            .await
            .unwrap();
        f.store.save_member(ChannelMember::new("c1", "u1")).await.unwrap();
        f.store.save_member(ChannelMember::new("c1", "u2")).await.unwrap();

        f.channels
            .permanent_delete_members_by_channel("c1")
            .await
            .unwrap();
        f.layer.drain().await;

        let mut users = engine.index_user_calls();
        users.sort();
        assert_eq!(users, ids(&["u1", "u2"]));
        assert!(f.store.get_members("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_member_delete_failure_reindexes_nobody() {
        let engine = Arc::new(RecordingEngine::new("rec"));
        let f = fixture(vec![engine.clone()]);
        f.store.save_user(User::new("u1", "alice")).await.unwrap();
        f.store
            .save(Channel::open("team-1", "town-square").with_id("c1"), 0)
            .await
            .unwrap();
        f.store.save_member(ChannelMember::new("c1", "u1")).await.unwrap();
        f.store.fail_operation("permanent_delete_members_by_channel");

        assert!(f
            .channels
            .permanent_delete_members_by_channel("c1")
            .await
            .is_err());
        f.layer.drain().await;
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_autocomplete_uses_engine_and_resolves() {
        let e1 = Arc::new(RecordingEngine::new("e1").with_search_failure());
        let e2 = Arc::new(RecordingEngine::new("e2").with_search_results(ids(&["c2", "c1", "c3"])));
        let e3 = Arc::new(RecordingEngine::new("e3"));
        let f = fixture(vec![e1.clone(), e2.clone(), e3.clone()]);
        f.store
            .save(Channel::open("team-1", "alpha").with_id("c1"), 0)
            .await
            .unwrap();
        f.store
            .save(Channel::open("team-1", "alpine").with_id("c2"), 0)
            .await
            .unwrap();
        f.store
            .save(Channel::open("team-1", "alps").with_id("c3").with_delete_at(5), 0)
            .await
            .unwrap();

        let channels = f
            .channels
            .autocomplete_in_team("team-1", "al", false)
            .await
            .unwrap();

        assert_eq!(channel_ids(&channels), vec!["c2", "c1"]);
        assert_eq!(e3.search_calls(), 0);
        assert_eq!(f.store.call_count("autocomplete_in_team"), 0);
    }

    #[tokio::test]
    async fn test_autocomplete_falls_back_to_store() {
        let off = Arc::new(RecordingEngine::new("off").with_capabilities(true, false));
        let f = fixture(vec![off.clone()]);
        f.store
            .save(
                Channel::open("team-1", "town-square")
                    .with_id("c1")
                    .with_display_name("Town Square"),
                0,
            )
            .await
            .unwrap();

        let channels = f
            .channels
            .autocomplete_in_team("team-1", "town", false)
            .await
            .unwrap();

        assert_eq!(channel_ids(&channels), vec!["c1"]);
        assert_eq!(off.search_calls(), 0);
        assert_eq!(f.store.call_count("autocomplete_in_team"), 1);
    }

    #[tokio::test]
    async fn test_autocomplete_fallback_error_returned() {
        let failing = Arc::new(RecordingEngine::new("failing").with_search_failure());
        let f = fixture(vec![failing.clone()]);
        f.store.fail_operation("autocomplete_in_team");

        let err = f
            .channels
            .autocomplete_in_team("team-1", "town", false)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Internal("autocomplete_in_team failed".to_string())
        );
    }

    #[tokio::test]
    async fn test_autocomplete_resolve_error_returned() {
        let engine = Arc::new(RecordingEngine::new("rec").with_search_results(ids(&["c1"])));
        let f = fixture(vec![engine.clone()]);
        f.store.fail_operation("get_channels_by_ids");

        let err = f
            .channels
            .autocomplete_in_team("team-1", "town", false)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Internal("get_channels_by_ids failed".to_string())
        );
        assert_eq!(f.store.call_count("autocomplete_in_team"), 0);
    }
}
