//! In-memory knowledge source (testing only).
//!
//! `MemoryKnowledgeSource` answers from scripted tables and records every
//! call, so evidence tests can exercise synonyms, broadened-topic retries,
//! timeouts and partial failure without a network.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{KnowledgeError, KnowledgeSource};

/// Duration a hanging call sleeps for; effectively forever under test.
const HANG: Duration = Duration::from_secs(24 * 60 * 60);

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeCall {
    Resolve(String),
    Fetch { identifier: String, topic: String },
}

/// Scripted [`KnowledgeSource`].
#[derive(Debug, Default)]
pub struct MemoryKnowledgeSource {
    identifiers: HashMap<String, String>,
    documents: HashMap<String, String>,
    failing_topics: HashSet<(String, String)>,
    hanging: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<KnowledgeCall>>,
}

impl MemoryKnowledgeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` resolve to `identifier` and serve `text` for it.
    pub fn with_document(mut self, name: &str, identifier: &str, text: &str) -> Self {
        self.identifiers
            .insert(name.to_string(), identifier.to_string());
        self.documents
            .insert(identifier.to_string(), text.to_string());
        self
    }

    /// Serve `text` for `identifier` without registering a name for it.
    pub fn with_text(mut self, identifier: &str, text: &str) -> Self {
        self.documents
            .insert(identifier.to_string(), text.to_string());
        self
    }

    /// Make an extra name resolve to an existing identifier.
    pub fn with_alias(mut self, name: &str, identifier: &str) -> Self {
        self.identifiers
            .insert(name.to_string(), identifier.to_string());
        self
    }

    /// Fail fetches of `topic` for `identifier` with a timeout error.
    pub fn with_failing_topic(mut self, identifier: &str, topic: &str) -> Self {
        self.failing_topics
            .insert((identifier.to_string(), topic.to_string()));
        self
    }

    /// Never answer calls that name `name_or_identifier`.
    pub fn with_hang(mut self, name_or_identifier: &str) -> Self {
        self.hanging.insert(name_or_identifier.to_string());
        self
    }

    /// Delay every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<KnowledgeCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn resolve_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                KnowledgeCall::Resolve(name) => Some(name),
                KnowledgeCall::Fetch { .. } => None,
            })
            .collect()
    }

    fn record(&self, call: KnowledgeCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    async fn pause(&self, key: &str) {
        if self.hanging.contains(key) {
            tokio::time::sleep(HANG).await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl KnowledgeSource for MemoryKnowledgeSource {
    async fn resolve(&self, name: &str) -> Result<String, KnowledgeError> {
        self.record(KnowledgeCall::Resolve(name.to_string()));
        self.pause(name).await;
        self.identifiers
            .get(name)
            .cloned()
            .ok_or(KnowledgeError::NotFound)
    }

    async fn fetch(
        &self,
        identifier: &str,
        topic: &str,
        _token_budget: u32,
    ) -> Result<String, KnowledgeError> {
        self.record(KnowledgeCall::Fetch {
            identifier: identifier.to_string(),
            topic: topic.to_string(),
        });
        self.pause(identifier).await;
        if self
            .failing_topics
            .contains(&(identifier.to_string(), topic.to_string()))
        {
            return Err(KnowledgeError::Timeout);
        }
        self.documents
            .get(identifier)
            .cloned()
            .ok_or(KnowledgeError::NotFound)
    }
}
