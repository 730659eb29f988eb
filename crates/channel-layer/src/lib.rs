//! # channel-layer
//!
//! Search layer over the primary channel store.
//!
//! Mutations go to the store first; only successful ones trigger
//! best-effort, fire-and-forget index propagation to every indexing
//! engine. Queries are routed to the first autocomplete engine that
//! answers, resolved back to channels through the store, and fall back
//! to the store's native implementation when no engine answers.
//!
//! ## Key Components
//!
//! - [`SearchLayer`]: root object; owns the propagator, re-indexes users
//! - [`SearchChannelStore`]: drop-in [`channel_storage::ChannelStore`]
//! - [`QueryRouter`]: first-success engine routing
//! - [`ResultResolver`]: ids to channels, order kept, deleted filtered

pub mod channel_store;
pub mod layer;
pub mod resolver;
pub mod router;

pub use channel_store::SearchChannelStore;
pub use layer::SearchLayer;
pub use resolver::ResultResolver;
pub use router::{QueryRouter, Routed};
