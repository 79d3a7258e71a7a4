//! Validation pipeline.
//!
//! Runs the Syntax, Structure, Content and Quality gates in order over an
//! artifact document and stops at the first failing gate, so a report never
//! holds results past its first failure.

mod gates;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Thresholds;
use crate::domain::{
    parse_document, CapabilitySet, ComplexityScore, GateName, GateResult, GeneratedArtifact,
    Result, ValidationReport,
};

pub use gates::{
    completeness, content_gate, quality_gate, readability, structure_gate, syntax_gate,
    REQUIRED_FIELDS,
};

/// Facts the Content gate checks the artifact against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    pub capabilities: CapabilitySet,
    pub complexity_score: ComplexityScore,
}

/// Validate a rendered artifact.
pub fn validate_artifact(
    artifact: &GeneratedArtifact,
    context: &ValidationContext,
    thresholds: &Thresholds,
) -> Result<ValidationReport> {
    let text = artifact.render()?;
    Ok(validate_document(&text, Some(context), thresholds))
}

/// Validate an artifact document.
///
/// Without a `context`, the Content gate derives capabilities and the
/// complexity score from the document's own metadata.
pub fn validate_document(
    text: &str,
    context: Option<&ValidationContext>,
    thresholds: &Thresholds,
) -> ValidationReport {
    let parsed = parse_document(text);
    let mut results = Vec::with_capacity(GateName::ORDER.len());

    let syntax = syntax_gate(&parsed);
    let proceed = syntax.passed;
    results.push(syntax);

    if proceed {
        let metadata = parsed.metadata.unwrap_or_default();
        let sections = parsed.sections;
        let remaining: [&dyn Fn() -> GateResult; 3] = [
            &|| structure_gate(&metadata, &sections),
            &|| content_gate(&metadata, context),
            &|| quality_gate(&sections, thresholds),
        ];
        for gate in remaining {
            let result = gate();
            let passed = result.passed;
            results.push(result);
            if !passed {
                break;
            }
        }
    }

    if let Some(failed) = results.iter().find(|r| !r.passed) {
        debug!(gate = %failed.gate, issues = failed.issues.len(), "validation failed");
    }

    ValidationReport {
        results,
        evaluated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Capability, IssueKind};

    const DOC: &str = "+++
name = \"testing-validate-agent\"
execution_tier = \"T1\"
permission_set = [\"read\", \"search\", \"execute\", \"write\"]
capabilities = [\"validate\"]
complexity_score = 2
+++

## Role

You are a testing agent that checks every change before it merges.

## Capabilities

You validate changes. You report failures with the failing command.

## Workflow

Run the suite, read the failures, and report them in order of severity.

## Constraints

Use only the granted tools. Never modify the code under test yourself.
";

    #[test]
    fn well_formed_document_passes_every_gate() {
        let report = validate_document(DOC, None, &Thresholds::default());
        assert!(report.passed(), "{:?}", report.first_failure());
        assert_eq!(report.results.len(), 4);
    }

    #[test]
    fn syntax_failure_stops_the_pipeline() {
        let report = validate_document("no front matter", None, &Thresholds::default());
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].gate, GateName::Syntax);
        assert!(!report.passed());
    }

    #[test]
    fn missing_name_stops_at_structure() {
        let doc = DOC.replace("name = \"testing-validate-agent\"\n", "");
        let report = validate_document(&doc, None, &Thresholds::default());
        assert_eq!(report.results.len(), 2);
        let structure = report.gate(GateName::Structure).unwrap();
        assert!(!structure.passed);
        assert_eq!(structure.issues[0].message, "missing field: name");
        assert!(report.gate(GateName::Content).is_none());
        assert!(report.gate(GateName::Quality).is_none());
    }

    #[test]
    fn explicit_context_overrides_metadata() {
        let ctx = ValidationContext {
            capabilities: [Capability::Monitor].into_iter().collect(),
            complexity_score: ComplexityScore::try_from(2).unwrap(),
        };
        let report = validate_document(DOC, Some(&ctx), &Thresholds::default());
        let content = report.first_failure().unwrap();
        assert_eq!(content.gate, GateName::Content);
        assert_eq!(content.issues[0].kind, IssueKind::Permission);
        assert_eq!(
            content.issues[0].message,
            "permission_set lacks network required by monitor"
        );
    }

    #[test]
    fn artifact_is_validated_against_its_run_context() {
        let artifact = parse_document(DOC).into_artifact().unwrap();
        let ctx = ValidationContext {
            capabilities: [Capability::Validate].into_iter().collect(),
            complexity_score: ComplexityScore::try_from(2).unwrap(),
        };
        let report = validate_artifact(&artifact, &ctx, &Thresholds::default()).unwrap();
        assert!(report.passed(), "{:?}", report.first_failure());

        let ctx = ValidationContext {
            complexity_score: ComplexityScore::try_from(5).unwrap(),
            ..ctx
        };
        let report = validate_artifact(&artifact, &ctx, &Thresholds::default()).unwrap();
        assert_eq!(report.first_failure().unwrap().gate, GateName::Content);
    }

    #[test]
    fn strict_word_minimum_fails_quality() {
        let thresholds = Thresholds {
            min_section_words: 50,
            ..Thresholds::default()
        };
        let report = validate_document(DOC, None, &thresholds);
        let quality = report.gate(GateName::Quality).unwrap();
        assert!(!quality.passed);
        assert_eq!(quality.score.map(|s| (s * 100.0).round()), Some(40.0));
    }
}
