//! Research evidence: knowledge-source contract, practice extraction and the
//! bundle attached to a run.
//!
//! - [`KnowledgeSource`]: the consumed lookup contract
//! - [`EvidenceGatherer`]: concurrent, deadline-bounded collection
//! - [`HttpKnowledgeSource`]: reqwest-backed source
//! - [`fakes::MemoryKnowledgeSource`]: scripted in-memory source for tests

pub mod fakes;
mod gatherer;
mod http;

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::ForgeError;
use crate::lexicon::GENERIC_PRACTICES;

pub use gatherer::{EvidenceGatherer, BROADENED_TOPIC};
pub use http::HttpKnowledgeSource;

/// Quality score carried by a fallback bundle.
pub const FALLBACK_QUALITY: f32 = 0.5;

/// Practice count at which the practice half of the quality score saturates.
pub const PRACTICE_SATURATION: usize = 10;

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Failure of a single knowledge-source call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KnowledgeError {
    #[error("not found")]
    NotFound,

    #[error("timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<KnowledgeError> for ForgeError {
    fn from(err: KnowledgeError) -> Self {
        ForgeError::EvidenceUnavailable(err.to_string())
    }
}

/// External documentation lookup service.
///
/// Implementations must be safe to call concurrently; the gatherer issues
/// one call chain per research target at the same time.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Resolve a human name (a domain label or framework) to a service
    /// identifier. Returns `KnowledgeError::NotFound` when unknown.
    async fn resolve(&self, name: &str) -> Result<String, KnowledgeError>;

    /// Fetch documentation text about `topic`, bounded by `token_budget`.
    async fn fetch(
        &self,
        identifier: &str,
        topic: &str,
        token_budget: u32,
    ) -> Result<String, KnowledgeError>;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Where a group of practices came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Research target (domain label or framework).
    pub target: String,
    /// Name that resolved, which may be a synonym of the target.
    pub resolved_name: String,
    pub identifier: String,
    pub topic: String,
}

/// Practices gathered for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub source_refs: Vec<SourceRef>,
    pub practices: Vec<String>,
    /// Always within `[0, 1]`.
    pub quality_score: f32,
    pub is_fallback: bool,
    pub targets_attempted: usize,
    pub targets_succeeded: usize,
}

impl EvidenceBundle {
    /// Bundle used when no target produced evidence.
    pub fn fallback(targets_attempted: usize) -> Self {
        Self {
            source_refs: Vec::new(),
            practices: GENERIC_PRACTICES.iter().map(|p| p.to_string()).collect(),
            quality_score: FALLBACK_QUALITY,
            is_fallback: true,
            targets_attempted,
            targets_succeeded: 0,
        }
    }

    pub fn source_labels(&self) -> Vec<String> {
        self.source_refs
            .iter()
            .map(|r| format!("{} ({})", r.target, r.identifier))
            .collect()
    }
}

/// `0.5·(succeeded / attempted) + 0.5·min(practices / 10, 1)`.
pub fn quality_score(succeeded: usize, attempted: usize, practices: usize) -> f32 {
    let coverage = if attempted == 0 {
        0.0
    } else {
        succeeded as f32 / attempted as f32
    };
    let richness = (practices as f32 / PRACTICE_SATURATION as f32).min(1.0);
    (0.5 * coverage + 0.5 * richness).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Practice extraction
// ---------------------------------------------------------------------------

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+•]|\d{1,3}[.)])\s+(.+?)\s*$")
        .expect("list item pattern is a valid regex")
});

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:should|must|always|never|avoid|prefer)\b")
        .expect("directive pattern is a valid regex")
});

/// Practices in fetched documentation: list items plus directive sentences,
/// de-duplicated case-insensitively and capped at `max`.
pub fn extract_practices(text: &str, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut practices = Vec::new();

    for line in text.lines() {
        let candidates: Vec<String> = match LIST_ITEM.captures(line) {
            Some(caps) => caps
                .get(1)
                .map(|m| vec![m.as_str().to_string()])
                .unwrap_or_default(),
            None => line
                .split_inclusive(['.', '!', '?'])
                .map(str::trim)
                .filter(|s| DIRECTIVE.is_match(s))
                .map(str::to_string)
                .collect(),
        };

        for candidate in candidates {
            let practice = candidate.trim().trim_start_matches('#').trim();
            if practice.split_whitespace().count() < 2 {
                continue;
            }
            if seen.insert(practice.to_lowercase()) {
                practices.push(practice.to_string());
                if practices.len() >= max {
                    return practices;
                }
            }
        }
    }
    practices
}
