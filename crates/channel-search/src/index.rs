//! On-disk channel index.
//!
//! One directory per engine. A directory holding an index with a
//! different schema is rejected instead of being overwritten.

use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::schema::{build_channel_schema, ChannelSchema};

const DEFAULT_WRITER_MEMORY_MB: usize = 50;
const BYTES_PER_MB: usize = 1024 * 1024;

/// Where an index lives and how much memory its writer may use.
#[derive(Debug, Clone)]
pub struct ChannelIndexConfig {
    pub index_path: PathBuf,
    pub writer_memory_mb: usize,
}

impl Default for ChannelIndexConfig {
    fn default() -> Self {
        Self::new("./channel-index")
    }
}

impl ChannelIndexConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }
}

/// An opened channel index plus its resolved field handles.
pub struct ChannelIndex {
    index: Index,
    schema: ChannelSchema,
    config: ChannelIndexConfig,
}

impl ChannelIndex {
    pub fn open_or_create(config: ChannelIndexConfig) -> Result<Self, EngineError> {
        let index = open_or_create_index(&config.index_path)?;
        let schema = ChannelSchema::from_schema(index.schema())?;
        Ok(Self {
            index,
            schema,
            config,
        })
    }

    pub fn schema(&self) -> &ChannelSchema {
        &self.schema
    }

    /// The single writer of this index. Tantivy allows one per directory.
    pub fn writer(&self) -> Result<IndexWriter, EngineError> {
        let budget = self.config.writer_memory_mb * BYTES_PER_MB;
        debug!(path = ?self.config.index_path, budget, "Acquiring index writer");
        Ok(self.index.writer(budget)?)
    }

    /// Reader that only sees new commits after an explicit `reload()`.
    pub fn reader(&self) -> Result<IndexReader, EngineError> {
        Ok(self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?)
    }

    pub fn path(&self) -> &Path {
        &self.config.index_path
    }
}

/// Open the index in `path`, creating the directory and an empty index
/// with the channel schema when none exists yet.
pub fn open_or_create_index(path: &Path) -> Result<Index, EngineError> {
    if path.join("meta.json").exists() {
        debug!(path = ?path, "Opening channel index");
        return Ok(Index::open_in_dir(path)?);
    }

    std::fs::create_dir_all(path)?;
    let index = Index::create_in_dir(path, build_channel_schema().schema().clone())?;
    info!(path = ?path, "Created channel index");
    Ok(index)
}
