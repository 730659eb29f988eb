//! Index propagation.
//!
//! [`IndexPropagator::propagate`] fans one subject out to every engine
//! that has indexing enabled at call time. Each engine gets its own
//! background task; the caller never waits for any of them. Failures and
//! panics inside a task are logged and counted, never returned.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use channel_search::{EngineCapability, SearchEngineRegistry};

use crate::job::{IndexJob, IndexOperation, IndexSubject};
use crate::metrics::{PropagationMetrics, PropagationMetricsSnapshot};

/// Default bound on concurrently running index jobs.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 64;

/// Bounded fire-and-forget fan-out of index jobs.
pub struct IndexPropagator {
    registry: Arc<SearchEngineRegistry>,
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
    metrics: Arc<PropagationMetrics>,
}

impl IndexPropagator {
    /// Create a propagator over `registry`. A zero bound is raised to one.
    pub fn new(registry: Arc<SearchEngineRegistry>, max_concurrent_jobs: usize) -> Self {
        Self {
            registry,
            tracker: TaskTracker::new(),
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
            metrics: Arc::new(PropagationMetrics::new()),
        }
    }

    /// Spawn one job per indexing-enabled engine. Must be called from
    /// within a Tokio runtime.
    pub fn propagate(&self, subject: IndexSubject, operation: IndexOperation) {
        if !subject.is_indexable() {
            PropagationMetrics::incr(&self.metrics.skipped_not_discoverable);
            debug!(
                entity = subject.kind(),
                entity_id = %subject.id(),
                operation = %operation,
                "Subject not discoverable, skipping propagation"
            );
            return;
        }

        let subject = Arc::new(subject);
        for engine in self.registry.active_engines() {
            if !EngineCapability::Indexing.is_enabled_on(engine.as_ref()) {
                PropagationMetrics::incr(&self.metrics.skipped_disabled);
                continue;
            }
            self.spawn(IndexJob::new(Arc::clone(&subject), operation, engine));
        }
    }

    fn spawn(&self, job: IndexJob) {
        PropagationMetrics::incr(&self.metrics.spawned);
        let permits = Arc::clone(&self.permits);
        let metrics = Arc::clone(&self.metrics);

        self.tracker.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(engine = %job.engine_name(), "Propagation semaphore closed, dropping job");
                    PropagationMetrics::incr(&metrics.failed);
                    return;
                }
            };

            match AssertUnwindSafe(job.run()).catch_unwind().await {
                Ok(Ok(())) => {
                    PropagationMetrics::incr(&metrics.succeeded);
                    debug!(
                        engine = %job.engine_name(),
                        entity = job.subject().kind(),
                        entity_id = %job.subject().id(),
                        operation = %job.operation(),
                        "Index job completed"
                    );
                }
                Ok(Err(e)) => {
                    PropagationMetrics::incr(&metrics.failed);
                    error!(
                        engine = %job.engine_name(),
                        entity = job.subject().kind(),
                        entity_id = %job.subject().id(),
                        operation = %job.operation(),
                        error = %e,
                        "Index job failed"
                    );
                }
                Err(panic) => {
                    PropagationMetrics::incr(&metrics.panicked);
                    error!(
                        engine = %job.engine_name(),
                        entity = job.subject().kind(),
                        entity_id = %job.subject().id(),
                        operation = %job.operation(),
                        panic = %panic_message(panic.as_ref()),
                        "Index job panicked"
                    );
                }
            }
        });
    }

    /// Wait for every job spawned so far. New jobs may still be spawned
    /// while draining; those spawned after the call returns are not awaited.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Number of jobs spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn metrics(&self) -> PropagationMetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
