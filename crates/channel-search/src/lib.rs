//! # channel-search
//!
//! Search engines for the channel search layer.
//!
//! ## Features
//! - [`SearchEngine`]: the contract every engine variant implements
//! - [`EngineCapabilities`]: runtime indexing/autocomplete flags, read fresh per call
//! - [`SearchEngineRegistry`]: ordered, hot-swappable set of active engines
//! - [`TantivyChannelEngine`]: embedded Tantivy index with prefix autocomplete
//! - [`mock::RecordingEngine`]: call-recording engine for tests

pub mod capability;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod mock;
pub mod registry;
pub mod schema;
pub mod tantivy_engine;

pub use capability::{EngineCapabilities, EngineCapability};
pub use document::{autocomplete_prefixes, channel_to_doc, query_prefix, user_to_doc};
pub use engine::{EngineHandle, SearchEngine};
pub use error::EngineError;
pub use index::{open_or_create_index, ChannelIndex, ChannelIndexConfig};
pub use registry::{EngineStatus, SearchEngineRegistry};
pub use schema::{build_channel_schema, ChannelSchema, DocType};
pub use tantivy_engine::TantivyChannelEngine;
