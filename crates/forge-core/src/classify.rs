//! Classification engine: [`SignalSet`] → [`Classification`].
//!
//! Every domain keyword hit adds [`KEYWORD_WEIGHT`] to its domain's bucket
//! and every framework adds [`FRAMEWORK_WEIGHT`] to the domain it belongs to.
//! The heaviest bucket is the primary domain; ties go to the domain that
//! comes first in [`Domain::ALL`]. Confidence compares the primary weight
//! against the weight of open ambiguities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Capability, CapabilitySet, Domain, SignalSet};
use crate::lexicon::framework_domain;

/// Weight contributed by one matched domain keyword.
pub const KEYWORD_WEIGHT: f32 = 1.0;

/// Weight contributed by one framework token, below a direct keyword hit.
pub const FRAMEWORK_WEIGHT: f32 = 0.5;

/// Weight contributed by one open ambiguity.
pub const AMBIGUITY_WEIGHT: f32 = 1.0;

/// Margin by which a clarified domain outweighs every inferred bucket.
pub const CLARIFIED_MARGIN: f32 = 3.0;

/// Secondary domains must reach this share of the primary weight.
pub const SECONDARY_RATIO: f32 = 0.5;

/// At most this many secondary domains are kept.
pub const MAX_SECONDARY: usize = 2;

/// Primary/secondary domains with a confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainClassification {
    pub primary_domain: Domain,
    /// At most two, never containing the primary domain.
    pub secondary_domains: Vec<Domain>,
    pub confidence: f32,
}

/// Full output of the classification engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub domain: DomainClassification,
    pub capabilities: CapabilitySet,
}

/// Why a run has to ask the requester for more detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    LowConfidence,
    NoCapabilities,
}

impl Classification {
    /// Reasons to escalate, empty when the classification is usable.
    pub fn escalation_reasons(&self, min_confidence: f32) -> Vec<EscalationReason> {
        let mut reasons = Vec::new();
        if self.domain.confidence < min_confidence {
            reasons.push(EscalationReason::LowConfidence);
        }
        if self.capabilities.is_empty() {
            reasons.push(EscalationReason::NoCapabilities);
        }
        reasons
    }
}

/// Classify a signal set.
pub fn classify(signals: &SignalSet) -> Classification {
    Classification {
        domain: classify_domain(signals),
        capabilities: capability_set(signals),
    }
}

fn classify_domain(signals: &SignalSet) -> DomainClassification {
    let mut buckets: BTreeMap<Domain, f32> = BTreeMap::new();
    for token in &signals.domain_tokens {
        *buckets.entry(token.domain).or_insert(0.0) += KEYWORD_WEIGHT;
    }
    for domain in signals.framework_tokens.iter().filter_map(|f| framework_domain(f)) {
        *buckets.entry(domain).or_insert(0.0) += FRAMEWORK_WEIGHT;
    }

    let mut ambiguity_weight = signals.ambiguities.len() as f32 * AMBIGUITY_WEIGHT;
    if let Some(domain) = signals.clarified_domain {
        let heaviest = buckets.values().copied().fold(0.0_f32, f32::max);
        buckets.insert(domain, heaviest + CLARIFIED_MARGIN);
        ambiguity_weight = 0.0;
    }

    // BTreeMap iterates in priority order, so sorting by weight alone is
    // stable with respect to the tie-break.
    let mut ranked: Vec<(Domain, f32)> = buckets.into_iter().filter(|(_, w)| *w > 0.0).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let Some(&(primary_domain, primary_weight)) = ranked.first() else {
        return DomainClassification {
            primary_domain: Domain::General,
            secondary_domains: Vec::new(),
            confidence: 0.0,
        };
    };

    let secondary_domains = ranked
        .iter()
        .skip(1)
        .filter(|(_, w)| *w >= primary_weight * SECONDARY_RATIO)
        .take(MAX_SECONDARY)
        .map(|(d, _)| *d)
        .collect();

    DomainClassification {
        primary_domain,
        secondary_domains,
        confidence: confidence(primary_weight, ambiguity_weight),
    }
}

/// `primary / (primary + ambiguity)`, clamped to `[0, 1]`; zero when there
/// is no signal at all.
pub fn confidence(primary_weight: f32, ambiguity_weight: f32) -> f32 {
    let total = primary_weight + ambiguity_weight;
    if total <= 0.0 {
        return 0.0;
    }
    (primary_weight / total).clamp(0.0, 1.0)
}

fn capability_set(signals: &SignalSet) -> CapabilitySet {
    if let Some(clarified) = &signals.clarified_capabilities {
        return clarified.clone();
    }
    signals
        .capability_tokens
        .iter()
        .map(|t| t.capability)
        .collect::<CapabilitySet>()
}

/// Capabilities as a comma-separated phrase (`"analyze, research and validate"`).
pub fn capability_phrase(capabilities: &CapabilitySet) -> String {
    let names: Vec<&str> = capabilities.iter().map(Capability::as_str).collect();
    match names.as_slice() {
        [] => "assist".to_string(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
