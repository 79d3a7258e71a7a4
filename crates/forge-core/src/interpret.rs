//! Request interpreter: raw text → [`SignalSet`].
//!
//! Matching is case-insensitive and whole-word. The request text and its
//! optional context are scanned against the domain, capability and
//! framework lexicons; vague or uncovered action phrases are recorded as
//! ambiguities rather than guessed at.

use tracing::debug;

use crate::domain::{CapabilityToken, DomainToken, Request, SignalSet};
use crate::lexicon::{
    action_objects, contains_phrase, is_known_word, normalize, CAPABILITY_KEYWORDS,
    DOMAIN_KEYWORDS, FRAMEWORK_KEYWORDS, VAGUE_PHRASES,
};

/// Extract signals from a validated request.
///
/// Each lexicon keyword counts at most once, however often it appears.
pub fn interpret(request: &Request) -> SignalSet {
    let mut text = normalize(request.raw_text());
    if let Some(context) = request.context() {
        text.push_str(normalize(context).trim_start());
    }

    let mut signals = SignalSet::default();

    for (keyword, domain) in DOMAIN_KEYWORDS {
        if contains_phrase(&text, keyword) {
            signals.domain_tokens.push(DomainToken {
                keyword: keyword.to_string(),
                domain: *domain,
            });
        }
    }

    for (keyword, capability) in CAPABILITY_KEYWORDS {
        if contains_phrase(&text, keyword) {
            signals.capability_tokens.push(CapabilityToken {
                keyword: keyword.to_string(),
                capability: *capability,
            });
        }
    }

    // Frameworks keep order of first appearance in the text.
    let mut frameworks: Vec<(usize, &str)> = FRAMEWORK_KEYWORDS
        .iter()
        .filter_map(|(keyword, canonical)| {
            text.find(&format!(" {keyword} ")).map(|pos| (pos, *canonical))
        })
        .collect();
    frameworks.sort_by_key(|(pos, _)| *pos);
    for (_, canonical) in frameworks {
        signals.add_framework(canonical);
    }

    for phrase in VAGUE_PHRASES {
        if contains_phrase(&text, phrase) {
            signals.ambiguities.push(phrase.to_string());
        }
    }

    for (phrase, object) in action_objects(&text) {
        if !is_known_word(&object) && !signals.ambiguities.contains(&phrase) {
            signals.ambiguities.push(phrase);
        }
    }

    debug!(
        domains = signals.domain_tokens.len(),
        capabilities = signals.capability_tokens.len(),
        frameworks = signals.framework_tokens.len(),
        ambiguities = signals.ambiguities.len(),
        "request interpreted"
    );
    signals
}
