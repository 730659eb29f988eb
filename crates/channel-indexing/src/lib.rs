//! Index propagation for the channel search layer.
//!
//! ## Key Components
//!
//! - [`IndexSubject`] / [`IndexOperation`]: what to index and how
//! - [`IndexJob`]: one subject, one operation, one engine
//! - [`IndexPropagator`]: bounded fire-and-forget fan-out across engines
//! - [`PropagationMetrics`]: outcome counters
//!
//! Propagation is eventually consistent and best-effort. A lost job is
//! never retried; the index catches up on the next mutation of the
//! same entity.

pub mod job;
pub mod metrics;
pub mod propagator;

pub use job::{IndexJob, IndexOperation, IndexSubject};
pub use metrics::{PropagationMetrics, PropagationMetricsSnapshot};
pub use propagator::{IndexPropagator, DEFAULT_MAX_CONCURRENT_JOBS};
