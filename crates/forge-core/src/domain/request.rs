//! Pipeline input and the signals extracted from it.

use serde::{Deserialize, Serialize};

use super::error::{ForgeError, Result};
use super::taxonomy::{Capability, CapabilitySet, Domain};

/// Maximum request length, in characters.
pub const MAX_REQUEST_CHARS: usize = 2000;

/// A natural-language description of the desired agent.
///
/// Immutable once constructed; [`Request::new`] is the only way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    raw_text: String,
    context: Option<String>,
}

impl Request {
    /// Validate and build a request.
    ///
    /// The text is trimmed; it must hold between 1 and
    /// [`MAX_REQUEST_CHARS`] characters.
    pub fn new(raw_text: &str, context: Option<&str>) -> Result<Self> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(ForgeError::InvalidRequest(
                "request text is empty".to_string(),
            ));
        }
        let chars = text.chars().count();
        if chars > MAX_REQUEST_CHARS {
            return Err(ForgeError::InvalidRequest(format!(
                "request text is {chars} characters, limit is {MAX_REQUEST_CHARS}"
            )));
        }
        let context = context
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Ok(Self {
            raw_text: text.to_string(),
            context,
        })
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

/// Keyword matches and open ambiguities for one run.
///
/// Only the clarification step mutates a signal set after interpretation;
/// answered values are kept apart from inferred tokens so they can dominate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSet {
    /// Matched domain keywords, paired with the domain they vote for.
    pub domain_tokens: Vec<DomainToken>,
    /// Matched capability keywords.
    pub capability_tokens: Vec<CapabilityToken>,
    /// Canonical framework names, de-duplicated, in order of appearance.
    pub framework_tokens: Vec<String>,
    /// Vague phrases no lexicon covers.
    pub ambiguities: Vec<String>,
    /// Domain picked by the requester during clarification.
    pub clarified_domain: Option<Domain>,
    /// Capabilities picked by the requester during clarification.
    pub clarified_capabilities: Option<CapabilitySet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainToken {
    pub keyword: String,
    pub domain: Domain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityToken {
    pub keyword: String,
    pub capability: Capability,
}

impl SignalSet {
    pub fn framework_count(&self) -> usize {
        self.framework_tokens.len()
    }

    pub fn add_framework(&mut self, name: &str) {
        if !self.framework_tokens.iter().any(|f| f == name) {
            self.framework_tokens.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_requests_are_rejected() {
        assert!(matches!(
            Request::new("", None),
            Err(ForgeError::InvalidRequest(_))
        ));
        assert!(matches!(
            Request::new("   \n\t", None),
            Err(ForgeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn over_length_request_is_rejected() {
        let text = "a".repeat(MAX_REQUEST_CHARS + 1);
        let err = Request::new(&text, None).unwrap_err();
        assert!(err.to_string().contains("limit is 2000"));
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let text = "é".repeat(MAX_REQUEST_CHARS);
        assert!(Request::new(&text, None).is_ok());
    }

    #[test]
    fn blank_context_is_dropped() {
        let request = Request::new("  build an api  ", Some("  ")).unwrap();
        assert_eq!(request.raw_text(), "build an api");
        assert_eq!(request.context(), None);
    }

    #[test]
    fn frameworks_are_deduplicated() {
        let mut signals = SignalSet::default();
        signals.add_framework("react");
        signals.add_framework("react");
        signals.add_framework("jest");
        assert_eq!(signals.framework_tokens, vec!["react", "jest"]);
    }
}
