//! Primary store for the channel search layer.
//!
//! Provides:
//! - The store contract ([`ChannelStore`], [`UserStore`]) the search layer wraps
//! - [`StoreError`], distinguishing "not found" from other failures
//! - [`MemoryStore`], an in-memory implementation with call counting and
//!   failure injection

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use traits::{ChannelStore, UserStore};
