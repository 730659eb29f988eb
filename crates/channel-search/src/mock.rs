//! Recording engine for tests.
//!
//! Records every call, returns configured search results and can be told
//! to fail, panic or hold index operations until released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use channel_types::{Channel, User};

use crate::capability::EngineCapabilities;
use crate::engine::SearchEngine;
use crate::error::EngineError;

/// A call observed by a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    IndexChannel(String),
    DeleteChannel(String),
    IndexUser {
        user_id: String,
        channel_ids: Vec<String>,
    },
    SearchChannels {
        team_id: String,
        term: String,
    },
}

/// Engine double that records calls instead of indexing.
pub struct RecordingEngine {
    name: String,
    capabilities: EngineCapabilities,
    calls: Mutex<Vec<EngineCall>>,
    search_results: Mutex<Vec<String>>,
    fail_indexing: AtomicBool,
    fail_search: AtomicBool,
    panic_on_index: AtomicBool,
    held: AtomicBool,
    release: Notify,
}

impl RecordingEngine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: EngineCapabilities::default(),
            calls: Mutex::new(Vec::new()),
            search_results: Mutex::new(Vec::new()),
            fail_indexing: AtomicBool::new(false),
            fail_search: AtomicBool::new(false),
            panic_on_index: AtomicBool::new(false),
            held: AtomicBool::new(false),
            release: Notify::new(),
        }
    }

    pub fn with_capabilities(self, indexing: bool, autocomplete: bool) -> Self {
        self.capabilities.set_indexing(indexing);
        self.capabilities.set_autocomplete(autocomplete);
        self
    }

    /// Ids returned by every successful `search_channels` call.
    pub fn with_search_results(self, ids: Vec<String>) -> Self {
        *self
            .search_results
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = ids;
        self
    }

    /// Make index, delete and user operations return an error.
    pub fn with_indexing_failure(self) -> Self {
        self.fail_indexing.store(true, Ordering::SeqCst);
        self
    }

    /// Make `search_channels` return an error.
    pub fn with_search_failure(self) -> Self {
        self.fail_search.store(true, Ordering::SeqCst);
        self
    }

    /// Make index, delete and user operations panic.
    pub fn with_panic_on_index(self) -> Self {
        self.panic_on_index.store(true, Ordering::SeqCst);
        self
    }

    /// Park index, delete and user operations until [`release`](Self::release).
    /// Parked calls are recorded on entry.
    pub fn with_held_indexing(self) -> Self {
        self.held.store(true, Ordering::SeqCst);
        self
    }

    /// Let held operations finish.
    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    /// Every call observed so far, in arrival order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn index_channel_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::IndexChannel(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn index_user_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::IndexUser { user_id, .. } => Some(user_id),
                _ => None,
            })
            .collect()
    }

    pub fn search_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::SearchChannels { .. }))
            .count()
    }

    fn record(&self, call: EngineCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    async fn write_op(&self, call: EngineCall) -> Result<(), EngineError> {
        let description = format!("{:?}", call);
        self.record(call);

        loop {
            let released = self.release.notified();
            if !self.held.load(Ordering::SeqCst) {
                break;
            }
            released.await;
        }

        if self.panic_on_index.load(Ordering::SeqCst) {
            panic!("{} panicked on {}", self.name, description);
        }
        if self.fail_indexing.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable(format!(
                "{} rejected {}",
                self.name, description
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchEngine for RecordingEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &EngineCapabilities {
        &self.capabilities
    }

    async fn index_channel(&self, channel: &Channel) -> Result<(), EngineError> {
        self.write_op(EngineCall::IndexChannel(channel.id.clone()))
            .await
    }

    async fn delete_channel(&self, channel: &Channel) -> Result<(), EngineError> {
        self.write_op(EngineCall::DeleteChannel(channel.id.clone()))
            .await
    }

    async fn index_user(&self, user: &User, channel_ids: &[String]) -> Result<(), EngineError> {
        self.write_op(EngineCall::IndexUser {
            user_id: user.id.clone(),
            channel_ids: channel_ids.to_vec(),
        })
        .await
    }

    async fn search_channels(
        &self,
        team_id: &str,
        term: &str,
    ) -> Result<Vec<String>, EngineError> {
        self.record(EngineCall::SearchChannels {
            team_id: team_id.to_string(),
            term: term.to_string(),
        });
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable(format!(
                "{} search failed",
                self.name
            )));
        }
        Ok(self
            .search_results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
