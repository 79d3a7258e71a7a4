//! The four validation gates.
//!
//! Each gate is a pure function from a parsed document to a [`GateResult`].

use std::collections::{BTreeMap, BTreeSet};

use super::ValidationContext;
use crate::config::Thresholds;
use crate::domain::{
    ArtifactSection, Capability, CapabilitySet, ComplexityScore, ExecutionTier, GateIssue,
    GateName, GateResult, IssueKind, MetadataValue, ParsedDocument, Permission,
};
use crate::generator::template_for;

/// Metadata keys every artifact must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "execution_tier", "permission_set"];

/// Average sentence length that still scores full readability.
pub const READABLE_SENTENCE_WORDS: f32 = 20.0;

/// Average sentence length at which readability reaches zero.
pub const UNREADABLE_SENTENCE_WORDS: f32 = 40.0;

pub const READABILITY_WEIGHT: f32 = 0.4;
pub const COMPLETENESS_WEIGHT: f32 = 0.6;

type Metadata = BTreeMap<String, MetadataValue>;

// ---------------------------------------------------------------------------
// Syntax
// ---------------------------------------------------------------------------

pub fn syntax_gate(parsed: &ParsedDocument) -> GateResult {
    let mut issues = parsed.issues.clone();
    if parsed.metadata.is_none() && issues.is_empty() {
        issues.push(GateIssue::new(IssueKind::Metadata, "metadata block is missing"));
    }
    GateResult::from_issues(GateName::Syntax, issues)
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

pub fn structure_gate(metadata: &Metadata, sections: &[ArtifactSection]) -> GateResult {
    let mut issues = Vec::new();

    for field in REQUIRED_FIELDS {
        if !metadata.contains_key(field) {
            issues.push(GateIssue::new(
                IssueKind::MissingField,
                format!("missing field: {field}"),
            ));
        }
    }
    if let Some(value) = metadata.get("name") {
        if value.as_text().map_or(true, |s| s.trim().is_empty()) {
            issues.push(GateIssue::new(
                IssueKind::Metadata,
                "field 'name' must be a non-empty string",
            ));
        }
    }
    if let Some(value) = metadata.get("permission_set") {
        if value.as_list().is_none() {
            issues.push(GateIssue::new(
                IssueKind::Metadata,
                "field 'permission_set' must be a list",
            ));
        }
    }

    if let Some(value) = metadata.get("execution_tier") {
        match value.as_text().map(str::parse::<ExecutionTier>) {
            Some(Ok(tier)) => {
                for heading in template_for(tier).required_sections() {
                    if !sections.iter().any(|s| s.heading == heading) {
                        issues.push(GateIssue::in_section(
                            IssueKind::MissingSection,
                            heading,
                            format!("missing section: {heading}"),
                        ));
                    }
                }
            }
            _ => issues.push(GateIssue::new(
                IssueKind::Metadata,
                format!("invalid execution_tier: {}", display_value(value)),
            )),
        }
    }

    GateResult::from_issues(GateName::Structure, issues)
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

pub fn content_gate(metadata: &Metadata, context: Option<&ValidationContext>) -> GateResult {
    let mut issues = Vec::new();

    let derived;
    let context = match context {
        Some(ctx) => ctx,
        None => match ValidationContext::from_metadata(metadata) {
            Ok(ctx) => {
                derived = ctx;
                &derived
            }
            Err(found) => return GateResult::from_issues(GateName::Content, found),
        },
    };

    let listed = metadata
        .get("permission_set")
        .and_then(MetadataValue::as_list)
        .unwrap_or_default();
    let mut granted = BTreeSet::new();
    for name in listed {
        match name.parse::<Permission>() {
            Ok(p) => {
                granted.insert(p);
            }
            Err(_) => issues.push(GateIssue::new(
                IssueKind::Permission,
                format!("unknown permission: {name}"),
            )),
        }
    }

    for perm in Permission::BASELINE {
        if !granted.contains(&perm) {
            issues.push(GateIssue::new(
                IssueKind::Permission,
                format!("permission_set lacks {perm} required for every agent"),
            ));
        }
    }
    for capability in context.capabilities.iter() {
        for perm in capability.permissions() {
            if !granted.contains(perm) {
                issues.push(GateIssue::new(
                    IssueKind::Permission,
                    format!("permission_set lacks {perm} required by {capability}"),
                ));
            }
        }
    }

    let expected = ExecutionTier::for_score(context.complexity_score);
    let declared = metadata
        .get("execution_tier")
        .and_then(MetadataValue::as_text)
        .and_then(|t| t.parse::<ExecutionTier>().ok());
    if declared != Some(expected) {
        issues.push(GateIssue::new(
            IssueKind::TierMismatch,
            format!(
                "execution_tier {} does not match complexity score {} (expected {expected})",
                declared.map_or("none", ExecutionTier::as_str),
                context.complexity_score
            ),
        ));
    }

    GateResult::from_issues(GateName::Content, issues)
}

// ---------------------------------------------------------------------------
// Quality
// ---------------------------------------------------------------------------

/// Readability of free text in `[0, 1]`.
///
/// Sentences end at `.`, `!`, `?` or a line break. An average of at most
/// 20 words scores 1, falling linearly to 0 at 40.
pub fn readability(text: &str) -> f32 {
    let lengths: Vec<usize> = text
        .split(['.', '!', '?', '\n'])
        .map(|s| s.split_whitespace().count())
        .filter(|n| *n > 0)
        .collect();
    if lengths.is_empty() {
        return 0.0;
    }
    let average = lengths.iter().sum::<usize>() as f32 / lengths.len() as f32;
    if average <= READABLE_SENTENCE_WORDS {
        1.0
    } else {
        let span = UNREADABLE_SENTENCE_WORDS - READABLE_SENTENCE_WORDS;
        ((UNREADABLE_SENTENCE_WORDS - average) / span).clamp(0.0, 1.0)
    }
}

/// Share of sections with at least `min_words` words.
pub fn completeness(sections: &[ArtifactSection], min_words: usize) -> f32 {
    if sections.is_empty() {
        return 0.0;
    }
    let complete = sections
        .iter()
        .filter(|s| s.word_count() >= min_words)
        .count();
    complete as f32 / sections.len() as f32
}

pub fn quality_gate(sections: &[ArtifactSection], thresholds: &Thresholds) -> GateResult {
    let text = sections
        .iter()
        .map(|s| s.body.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let score = READABILITY_WEIGHT * readability(&text)
        + COMPLETENESS_WEIGHT * completeness(sections, thresholds.min_section_words);

    let mut issues = Vec::new();
    if score < thresholds.quality_min {
        for section in sections {
            let words = section.word_count();
            if words < thresholds.min_section_words {
                issues.push(GateIssue::in_section(
                    IssueKind::ThinSection,
                    &section.heading,
                    format!(
                        "section '{}' is too thin ({words} words, minimum {})",
                        section.heading, thresholds.min_section_words
                    ),
                ));
            }
        }
        issues.push(GateIssue::new(
            IssueKind::LowQuality,
            format!(
                "quality score {score:.2} is below {:.2}",
                thresholds.quality_min
            ),
        ));
    }

    GateResult {
        score: Some(score),
        ..GateResult::from_issues(GateName::Quality, issues)
    }
}

fn display_value(value: &MetadataValue) -> String {
    match value {
        MetadataValue::Text(s) => s.clone(),
        MetadataValue::Integer(n) => n.to_string(),
        MetadataValue::List(items) => format!("[{}]", items.join(", ")),
    }
}

// ---------------------------------------------------------------------------
// Context derivation
// ---------------------------------------------------------------------------

impl ValidationContext {
    /// Rebuild the content-gate context from an artifact's own metadata.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, Vec<GateIssue>> {
        let mut issues = Vec::new();

        let capabilities = match metadata.get("capabilities").map(MetadataValue::as_list) {
            Some(Some(names)) => {
                let mut parsed = Vec::new();
                for name in names {
                    match name.parse::<Capability>() {
                        Ok(c) => parsed.push(c),
                        Err(_) => issues.push(GateIssue::new(
                            IssueKind::Metadata,
                            format!("unknown capability: {name}"),
                        )),
                    }
                }
                Some(parsed.into_iter().collect::<CapabilitySet>())
            }
            Some(None) => {
                issues.push(GateIssue::new(
                    IssueKind::Metadata,
                    "field 'capabilities' must be a list",
                ));
                None
            }
            None => {
                issues.push(GateIssue::new(
                    IssueKind::MissingField,
                    "missing field: capabilities",
                ));
                None
            }
        };

        let complexity_score = match metadata.get("complexity_score") {
            Some(value) => {
                let score = value
                    .as_integer()
                    .and_then(|n| u8::try_from(n).ok())
                    .and_then(|n| ComplexityScore::try_from(n).ok());
                if score.is_none() {
                    issues.push(GateIssue::new(
                        IssueKind::Metadata,
                        format!(
                            "field 'complexity_score' must be an integer within 1..=10, got {}",
                            display_value(value)
                        ),
                    ));
                }
                score
            }
            None => {
                issues.push(GateIssue::new(
                    IssueKind::MissingField,
                    "missing field: complexity_score",
                ));
                None
            }
        };

        match (capabilities, complexity_score) {
            (Some(capabilities), Some(complexity_score)) if issues.is_empty() => Ok(Self {
                capabilities,
                complexity_score,
            }),
            _ => Err(issues),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, MetadataValue)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn text(s: &str) -> MetadataValue {
        MetadataValue::Text(s.to_string())
    }

    fn list(items: &[&str]) -> MetadataValue {
        MetadataValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    fn t1_sections() -> Vec<ArtifactSection> {
        ["Role", "Capabilities", "Workflow", "Constraints"]
            .iter()
            .map(|h| {
                ArtifactSection::new(*h, "This body has well over eight words in one sentence.")
            })
            .collect()
    }

    #[test]
    fn missing_name_is_reported_verbatim() {
        let md = metadata(&[
            ("execution_tier", text("T1")),
            ("permission_set", list(&["read", "search"])),
        ]);
        let result = structure_gate(&md, &t1_sections());
        assert!(!result.passed);
        assert_eq!(result.issues[0].message, "missing field: name");
    }

    #[test]
    fn missing_tier_section_is_tagged() {
        let md = metadata(&[
            ("name", text("x")),
            ("execution_tier", text("T2")),
            ("permission_set", list(&["read", "search"])),
        ]);
        let result = structure_gate(&md, &t1_sections());
        let missing: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::MissingSection)
            .map(|i| i.section.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(missing, vec!["Knowledge", "Quality Checks"]);
    }

    #[test]
    fn invalid_tier_is_reported() {
        let md = metadata(&[
            ("name", text("x")),
            ("execution_tier", text("T9")),
            ("permission_set", list(&[])),
        ]);
        let result = structure_gate(&md, &[]);
        assert_eq!(result.issues[0].message, "invalid execution_tier: T9");
    }

    #[test]
    fn content_requires_capability_permissions_and_matching_tier() {
        let md = metadata(&[
            ("execution_tier", text("T1")),
            ("permission_set", list(&["read", "search"])),
        ]);
        let ctx = ValidationContext {
            capabilities: [Capability::Research].into_iter().collect::<CapabilitySet>(),
            complexity_score: ComplexityScore::try_from(7).unwrap(),
        };
        let result = content_gate(&md, Some(&ctx));
        let messages: Vec<&str> = result.issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "permission_set lacks network required by research",
                "execution_tier T1 does not match complexity score 7 (expected T3)",
            ]
        );
    }

    #[test]
    fn content_derives_context_from_metadata() {
        let md = metadata(&[
            ("execution_tier", text("T1")),
            ("permission_set", list(&["read", "search", "execute"])),
            ("capabilities", list(&["validate"])),
            ("complexity_score", MetadataValue::Integer(2)),
        ]);
        assert!(content_gate(&md, None).passed);

        let md = metadata(&[("permission_set", list(&["read", "search"]))]);
        let result = content_gate(&md, None);
        let messages: Vec<&str> = result.issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["missing field: capabilities", "missing field: complexity_score"]
        );
    }

    #[test]
    fn readability_falls_linearly() {
        assert_eq!(readability("Short and clear."), 1.0);
        let thirty = vec!["word"; 30].join(" ");
        assert!((readability(&thirty) - 0.5).abs() < 1e-6);
        let fifty = vec!["word"; 50].join(" ");
        assert_eq!(readability(&fifty), 0.0);
        assert_eq!(readability(""), 0.0);
    }

    #[test]
    fn thin_sections_fail_quality_with_section_tags() {
        let sections = vec![
            ArtifactSection::new("Role", "Too short."),
            ArtifactSection::new("Workflow", "Also short."),
            ArtifactSection::new("Constraints", "This one easily clears the eight word minimum."),
        ];
        let result = quality_gate(&sections, &Thresholds::default());
        assert!(!result.passed);
        // 0.4 * 1.0 + 0.6 * (1/3)
        assert!((result.score.unwrap() - 0.6).abs() < 1e-6);
        let thin: Vec<_> = result
            .issues
            .iter()
            .filter_map(|i| i.section.as_deref())
            .collect();
        assert_eq!(thin, vec!["Role", "Workflow"]);
        assert_eq!(result.issues.last().unwrap().kind, IssueKind::LowQuality);
    }

    #[test]
    fn complete_sections_pass_quality() {
        let result = quality_gate(&t1_sections(), &Thresholds::default());
        assert!(result.passed);
        assert!((result.score.unwrap() - 1.0).abs() < 1e-6);
    }
}
