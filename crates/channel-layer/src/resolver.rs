//! Turn engine ids back into channels.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use channel_storage::{ChannelStore, StoreError};
use channel_types::{AutocompleteOptions, Channel, ChannelList};

/// Resolves engine results against the primary store.
///
/// Output keeps the engine's id order. Ids that no longer exist or fail
/// the deleted-filter are dropped silently. A store error is returned
/// as-is: this is the synchronous read path.
pub struct ResultResolver {
    store: Arc<dyn ChannelStore>,
}

impl ResultResolver {
    pub fn new(store: Arc<dyn ChannelStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        ids: &[String],
        options: &AutocompleteOptions,
    ) -> Result<ChannelList, StoreError> {
        if ids.is_empty() {
            return Ok(ChannelList::new());
        }

        let mut by_id: HashMap<String, Channel> = self
            .store
            .get_channels_by_ids(ids)
            .await?
            .into_iter()
            .map(|channel| (channel.id.clone(), channel))
            .collect();

        let channels: ChannelList = ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .filter(|channel| options.accepts(channel))
            .collect();

        debug!(requested = ids.len(), resolved = channels.len(), "Resolved engine results");
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_storage::MemoryStore;

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (id, name) in [("a", "alpha"), ("b", "bravo"), ("c", "charlie")] {
            store
                .save(Channel::open("team-1", name).with_id(id), 0)
                .await
                .unwrap();
        }
        let deleted = store.get("b", false).await.unwrap().with_delete_at(1_000);
        store.update(deleted).await.unwrap();
        store
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn channel_ids(channels: &ChannelList) -> Vec<&str> {
        channels.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_empty_ids_skip_store() {
        let store = seeded().await;
        let resolver = ResultResolver::new(store.clone());
        let before = store.call_count("get_channels_by_ids");

        let channels = resolver.resolve(&[], &AutocompleteOptions::new()).await.unwrap();
        assert!(channels.is_empty());
        assert_eq!(store.call_count("get_channels_by_ids"), before);
    }

    #[tokio::test]
    async fn test_deleted_excluded_by_default() {
        let store = seeded().await;
        let resolver = ResultResolver::new(store);

        let channels = resolver
            .resolve(&ids(&["a", "b"]), &AutocompleteOptions::new())
            .await
            .unwrap();
        assert_eq!(channel_ids(&channels), vec!["a"]);

        let channels = resolver
            .resolve(
                &ids(&["a", "b"]),
                &AutocompleteOptions::new().with_include_deleted(true),
            )
            .await
            .unwrap();
        assert_eq!(channel_ids(&channels), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_preserves_engine_order_and_drops_unknown() {
        let store = seeded().await;
        let resolver = ResultResolver::new(store);

        let channels = resolver
            .resolve(&ids(&["c", "gone", "a"]), &AutocompleteOptions::new())
            .await
            .unwrap();
        assert_eq!(channel_ids(&channels), vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let store = seeded().await;
        store.fail_operation("get_channels_by_ids");
        let resolver = ResultResolver::new(store);

        let err = resolver
            .resolve(&ids(&["a"]), &AutocompleteOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
    }
}
