//! Tantivy-backed search engine.
//!
//! One embedded index per engine. Every write replaces the document by
//! its type-qualified key, commits and reloads the reader, so a document
//! is searchable as soon as the write returns.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{IndexReader, IndexWriter, TantivyDocument, Term};
use tracing::{debug, info};

use channel_types::{Channel, EngineSettings, User};

use crate::capability::{EngineCapabilities, EngineCapability};
use crate::document::{channel_to_doc, query_prefix, user_to_doc};
use crate::engine::SearchEngine;
use crate::error::EngineError;
use crate::index::{ChannelIndex, ChannelIndexConfig};
use crate::schema::{ChannelSchema, DocType};

/// Maximum channel ids returned per search.
const SEARCH_LIMIT: usize = 100;

struct IndexState {
    schema: ChannelSchema,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
}

impl IndexState {
    fn key_term(&self, doc_type: DocType, id: &str) -> Term {
        Term::from_field_text(self.schema.doc_key, &doc_type.key(id))
    }

    fn commit_and_reload(&self, mut writer: std::sync::MutexGuard<'_, IndexWriter>) -> Result<(), EngineError> {
        let opstamp = writer.commit()?;
        drop(writer);
        self.reader.reload()?;
        debug!(opstamp, "Committed channel index");
        Ok(())
    }

    fn upsert(&self, doc_type: DocType, id: &str, doc: TantivyDocument) -> Result<(), EngineError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| EngineError::IndexLocked(e.to_string()))?;

        writer.delete_term(self.key_term(doc_type, id));
        writer.add_document(doc)?;
        self.commit_and_reload(writer)
    }

    fn delete(&self, doc_type: DocType, id: &str) -> Result<(), EngineError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| EngineError::IndexLocked(e.to_string()))?;

        writer.delete_term(self.key_term(doc_type, id));
        self.commit_and_reload(writer)
    }

    fn search_channels(&self, team_id: &str, term: &str) -> Result<Vec<String>, EngineError> {
        let term = query_prefix(term);
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![
            (
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.schema.doc_type, DocType::Channel.as_str()),
                    IndexRecordOption::Basic,
                )),
            ),
            (
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.schema.team_id, team_id),
                    IndexRecordOption::Basic,
                )),
            ),
        ];
        if !term.is_empty() {
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.schema.prefix, &term),
                    IndexRecordOption::Basic,
                )),
            ));
        }

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&BooleanQuery::new(clauses), &TopDocs::with_limit(SEARCH_LIMIT))?;

        let mut ids = Vec::with_capacity(top_docs.len());
        for (_score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            if let Some(id) = doc.get_first(self.schema.doc_id).and_then(|v| v.as_str()) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// Search engine over an embedded Tantivy index.
pub struct TantivyChannelEngine {
    name: String,
    capabilities: EngineCapabilities,
    state: Arc<IndexState>,
}

impl TantivyChannelEngine {
    /// Open (or create) the engine described by `settings`.
    pub fn open(settings: &EngineSettings) -> Result<Self, EngineError> {
        let config = ChannelIndexConfig::new(settings.expanded_index_path())
            .with_memory_mb(settings.writer_memory_mb);
        let capabilities =
            EngineCapabilities::new(settings.indexing_enabled, settings.autocomplete_enabled);
        Self::with_config(settings.name.clone(), config, capabilities)
    }

    pub fn with_config(
        name: impl Into<String>,
        config: ChannelIndexConfig,
        capabilities: EngineCapabilities,
    ) -> Result<Self, EngineError> {
        let name = name.into();
        let index = ChannelIndex::open_or_create(config)?;
        let state = IndexState {
            schema: index.schema().clone(),
            writer: Mutex::new(index.writer()?),
            reader: index.reader()?,
        };
        info!(engine = %name, path = ?index.path(), "Opened tantivy channel engine");

        Ok(Self {
            name,
            capabilities,
            state: Arc::new(state),
        })
    }

    /// Number of documents (channels and users) currently searchable.
    pub fn num_docs(&self) -> u64 {
        self.state.num_docs()
    }

    fn ensure(&self, capability: EngineCapability) -> Result<(), EngineError> {
        if capability.is_enabled_on(self) {
            Ok(())
        } else {
            Err(EngineError::Disabled {
                engine: self.name.clone(),
                capability: capability.as_str(),
            })
        }
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&IndexState) -> Result<T, EngineError> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || op(&state)).await?
    }
}

#[async_trait]
impl SearchEngine for TantivyChannelEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &EngineCapabilities {
        &self.capabilities
    }

    async fn index_channel(&self, channel: &Channel) -> Result<(), EngineError> {
        self.ensure(EngineCapability::Indexing)?;
        let channel = channel.clone();
        self.run_blocking(move |state| {
            let doc = channel_to_doc(&state.schema, &channel);
            state.upsert(DocType::Channel, &channel.id, doc)?;
            debug!(channel_id = %channel.id, "Indexed channel");
            Ok(())
        })
        .await
    }

    async fn delete_channel(&self, channel: &Channel) -> Result<(), EngineError> {
        self.ensure(EngineCapability::Indexing)?;
        let channel_id = channel.id.clone();
        self.run_blocking(move |state| {
            state.delete(DocType::Channel, &channel_id)?;
            debug!(channel_id = %channel_id, "Deleted channel from index");
            Ok(())
        })
        .await
    }

    async fn index_user(&self, user: &User, channel_ids: &[String]) -> Result<(), EngineError> {
        self.ensure(EngineCapability::Indexing)?;
        let user = user.clone();
        let channel_ids = channel_ids.to_vec();
        self.run_blocking(move |state| {
            let doc = user_to_doc(&state.schema, &user, &channel_ids);
            state.upsert(DocType::User, &user.id, doc)?;
            debug!(user_id = %user.id, channels = channel_ids.len(), "Indexed user");
            Ok(())
        })
        .await
    }

    async fn search_channels(
        &self,
        team_id: &str,
        term: &str,
    ) -> Result<Vec<String>, EngineError> {
        self.ensure(EngineCapability::Autocomplete)?;
        let team_id = team_id.to_string();
        let term = term.to_string();
        self.run_blocking(move |state| state.search_channels(&team_id, &term))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_engine(dir: &TempDir) -> TantivyChannelEngine {
        TantivyChannelEngine::with_config(
            "tantivy",
            ChannelIndexConfig::new(dir.path()),
            EngineCapabilities::default(),
        )
        .unwrap()
    }

    fn channel(id: &str, team: &str, name: &str, display: &str) -> Channel {
        Channel::open(team, name)
            .with_id(id)
            .with_display_name(display)
    }

    #[tokio::test]
    async fn test_index_and_search_by_prefix() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);

        engine
            .index_channel(&channel("c1", "team-1", "town-square", "Town Square"))
            .await
            .unwrap();
        engine
            .index_channel(&channel("c2", "team-1", "off-topic", "Off-Topic"))
            .await
            .unwrap();
        engine
            .index_channel(&channel("c3", "team-2", "town-hall", "Town Hall"))
            .await
            .unwrap();

        let ids = engine.search_channels("team-1", "Tow").await.unwrap();
        assert_eq!(ids, vec!["c1".to_string()]);

        let ids = engine.search_channels("team-1", "top").await.unwrap();
        assert_eq!(ids, vec!["c2".to_string()]);

        let mut all = engine.search_channels("team-1", "").await.unwrap();
        all.sort();
        assert_eq!(all, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[tokio::test]
    async fn test_search_term_longer_than_indexed_prefixes() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);

        engine
            .index_channel(&channel(
                "c1",
                "team-1",
                "quarterly-planning",
                "Quarterly Engineering Planning Roundtable",
            ))
            .await
            .unwrap();

        let ids = engine
            .search_channels("team-1", "Quarterly Engineering Planning Round")
            .await
            .unwrap();
        assert_eq!(ids, vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_reindex_replaces_document() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);

        engine
            .index_channel(&channel("c1", "team-1", "alpha", "Alpha"))
            .await
            .unwrap();
        engine
            .index_channel(&channel("c1", "team-1", "beta", "Beta"))
            .await
            .unwrap();

        assert_eq!(engine.num_docs(), 1);
        assert!(engine.search_channels("team-1", "alp").await.unwrap().is_empty());
        assert_eq!(
            engine.search_channels("team-1", "bet").await.unwrap(),
            vec!["c1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_channel() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        let ch = channel("c1", "team-1", "alpha", "Alpha");

        engine.index_channel(&ch).await.unwrap();
        engine.delete_channel(&ch).await.unwrap();

        assert!(engine.search_channels("team-1", "alp").await.unwrap().is_empty());
        assert_eq!(engine.num_docs(), 0);
    }

    #[tokio::test]
    async fn test_users_do_not_appear_in_channel_search() {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);

        engine
            .index_user(&User::new("c1", "alpha"), &["c9".to_string()])
            .await
            .unwrap();
        engine
            .index_channel(&channel("c1", "team-1", "alpha", "Alpha"))
            .await
            .unwrap();

        // Same raw id, different document types: both survive
        assert_eq!(engine.num_docs(), 2);
        assert_eq!(
            engine.search_channels("team-1", "alp").await.unwrap(),
            vec!["c1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_open_from_settings() {
        let dir = TempDir::new().unwrap();
        let settings = EngineSettings::tantivy("configured", dir.path().to_string_lossy())
            .with_autocomplete(false);

        let engine = TantivyChannelEngine::open(&settings).unwrap();
        assert_eq!(engine.name(), "configured");
        assert!(engine.is_indexing_enabled());
        assert!(!engine.is_autocomplete_enabled());

        let err = engine.search_channels("team-1", "a").await.unwrap_err();
        assert!(matches!(err, EngineError::Disabled { .. }));
    }
}
