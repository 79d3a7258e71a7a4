//! Concurrent evidence collection under a shared deadline.

use std::sync::Arc;

use futures::future::join_all;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use super::{
    extract_practices, quality_score, EvidenceBundle, KnowledgeError, KnowledgeSource, SourceRef,
};
use crate::classify::Classification;
use crate::config::EvidenceConfig;
use crate::domain::{Domain, ForgeError, Result, SignalSet};
use crate::lexicon::synonyms;

/// Topic used for the single retry after a failed fetch.
pub const BROADENED_TOPIC: &str = "best practices";

/// Collects practices for a run's research targets.
///
/// Every target runs concurrently. Each knowledge-source call is bounded by
/// the per-fetch timeout and every target by one overall deadline. Failures
/// never escape [`EvidenceGatherer::gather`]; they only shrink the bundle.
#[derive(Clone)]
pub struct EvidenceGatherer {
    source: Option<Arc<dyn KnowledgeSource>>,
    settings: EvidenceConfig,
}

#[derive(Debug)]
struct TargetEvidence {
    source_ref: SourceRef,
    practices: Vec<String>,
}

impl EvidenceGatherer {
    pub fn new(source: Option<Arc<dyn KnowledgeSource>>, settings: EvidenceConfig) -> Self {
        Self { source, settings }
    }

    /// Research targets: primary domain, secondary domains, then frameworks,
    /// de-duplicated. The general domain is not a research topic.
    pub fn targets(classification: &Classification, signals: &SignalSet) -> Vec<String> {
        let mut targets: Vec<String> = Vec::new();
        let domains = std::iter::once(classification.domain.primary_domain)
            .chain(classification.domain.secondary_domains.iter().copied())
            .filter(|d| *d != Domain::General);
        for name in domains
            .map(|d| d.label().to_string())
            .chain(signals.framework_tokens.iter().cloned())
        {
            if !targets.contains(&name) {
                targets.push(name);
            }
        }
        targets
    }

    /// Gather evidence, falling back to generic practices when nothing could
    /// be retrieved.
    pub async fn gather(
        &self,
        classification: &Classification,
        signals: &SignalSet,
    ) -> EvidenceBundle {
        let targets = Self::targets(classification, signals);
        match self.try_gather(&targets).await {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!(error = %err, targets = targets.len(), "using fallback evidence");
                EvidenceBundle::fallback(targets.len())
            }
        }
    }

    /// Gather evidence for explicit targets. Fails with
    /// `EvidenceUnavailable` when no target succeeds.
    pub async fn try_gather(&self, targets: &[String]) -> Result<EvidenceBundle> {
        let Some(source) = self.source.as_ref() else {
            return Err(ForgeError::EvidenceUnavailable(
                "no knowledge source configured".to_string(),
            ));
        };
        if targets.is_empty() {
            return Err(ForgeError::EvidenceUnavailable(
                "no research targets".to_string(),
            ));
        }

        let deadline = Instant::now() + self.settings.overall_timeout();
        let results = join_all(targets.iter().map(|target| {
            let source = Arc::clone(source);
            async move {
                let outcome = timeout_at(deadline, self.gather_target(source.as_ref(), target))
                    .await
                    .unwrap_or(Err(KnowledgeError::Timeout));
                (target, outcome)
            }
        }))
        .await;

        let mut source_refs = Vec::new();
        let mut practices: Vec<String> = Vec::new();
        for (target, outcome) in results {
            match outcome {
                Ok(evidence) => {
                    for practice in evidence.practices {
                        if !practices.iter().any(|p| p.eq_ignore_ascii_case(&practice)) {
                            practices.push(practice);
                        }
                    }
                    source_refs.push(evidence.source_ref);
                }
                Err(err) => {
                    debug!(target = %target, error = %err, "research target failed");
                }
            }
        }

        if source_refs.is_empty() {
            return Err(ForgeError::EvidenceUnavailable(format!(
                "all {} research target(s) failed",
                targets.len()
            )));
        }

        let succeeded = source_refs.len();
        Ok(EvidenceBundle {
            quality_score: quality_score(succeeded, targets.len(), practices.len()),
            source_refs,
            practices,
            is_fallback: false,
            targets_attempted: targets.len(),
            targets_succeeded: succeeded,
        })
    }

    async fn gather_target(
        &self,
        source: &dyn KnowledgeSource,
        target: &str,
    ) -> std::result::Result<TargetEvidence, KnowledgeError> {
        let (resolved_name, identifier) = self.resolve(source, target).await?;

        let topic = format!("{target} {BROADENED_TOPIC}");
        let (topic, text) = match self.fetch(source, &identifier, &topic).await {
            Ok(text) => (topic, text),
            Err(err) => {
                debug!(target = %target, error = %err, "retrying with broadened topic");
                let text = self.fetch(source, &identifier, BROADENED_TOPIC).await?;
                (BROADENED_TOPIC.to_string(), text)
            }
        };

        Ok(TargetEvidence {
            practices: extract_practices(&text, self.settings.max_practices_per_source),
            source_ref: SourceRef {
                target: target.to_string(),
                resolved_name,
                identifier,
                topic,
            },
        })
    }

    /// Try the target name, then its synonyms while the service answers
    /// `NotFound`.
    async fn resolve(
        &self,
        source: &dyn KnowledgeSource,
        target: &str,
    ) -> std::result::Result<(String, String), KnowledgeError> {
        let names = std::iter::once(target).chain(
            synonyms(target)
                .iter()
                .copied()
                .take(self.settings.max_synonyms),
        );
        for name in names {
            match timeout(self.settings.fetch_timeout(), source.resolve(name)).await {
                Ok(Ok(identifier)) => return Ok((name.to_string(), identifier)),
                Ok(Err(KnowledgeError::NotFound)) => continue,
                Ok(Err(err)) => return Err(err),
                Err(_) => return Err(KnowledgeError::Timeout),
            }
        }
        Err(KnowledgeError::NotFound)
    }

    async fn fetch(
        &self,
        source: &dyn KnowledgeSource,
        identifier: &str,
        topic: &str,
    ) -> std::result::Result<String, KnowledgeError> {
        timeout(
            self.settings.fetch_timeout(),
            source.fetch(identifier, topic, self.settings.token_budget),
        )
        .await
        .unwrap_or(Err(KnowledgeError::Timeout))
    }
}
