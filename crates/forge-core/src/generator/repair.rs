//! Bounded artifact repair.
//!
//! Validation issues that point at a body section become [`RepairHint`]s.
//! Repair only touches body sections: metadata findings produce no hint and
//! therefore end the repair loop.

use serde::{Deserialize, Serialize};

use super::render::{render_section, GenerationContext};
use crate::domain::{ArtifactSection, GateResult, GeneratedArtifact, IssueKind, Result};

/// What to do with one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    /// Render the section afresh from its template (missing or malformed).
    Rerender,
    /// Append expansion text (thin).
    Expand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairHint {
    pub action: RepairAction,
    pub section: String,
}

/// Outcome of planning one repair attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// Hints to apply on the next attempt.
    Planned { hints: Vec<RepairHint> },

    /// The failing gate produced nothing repair can act on.
    NothingToRepair,

    /// Max attempts exceeded.
    ExhaustedAttempts { attempts: u32 },
}

/// Decide whether another repair attempt is allowed and what it should do.
pub fn plan_repair(
    failed: &GateResult,
    current_attempt: u32,
    max_attempts: u32,
) -> RepairOutcome {
    if current_attempt >= max_attempts {
        return RepairOutcome::ExhaustedAttempts {
            attempts: current_attempt,
        };
    }
    let hints = hints_for(failed);
    if hints.is_empty() {
        RepairOutcome::NothingToRepair
    } else {
        RepairOutcome::Planned { hints }
    }
}

/// Section-scoped hints for a failed gate, one per section.
pub fn hints_for(failed: &GateResult) -> Vec<RepairHint> {
    let mut hints: Vec<RepairHint> = Vec::new();
    for issue in &failed.issues {
        let Some(section) = issue.section.as_deref() else {
            continue;
        };
        let action = match issue.kind {
            IssueKind::MissingSection | IssueKind::MalformedSection => RepairAction::Rerender,
            IssueKind::ThinSection => RepairAction::Expand,
            _ => continue,
        };
        match hints.iter_mut().find(|h| h.section == section) {
            // Re-rendering subsumes expanding.
            Some(existing) => {
                if action == RepairAction::Rerender {
                    existing.action = action;
                }
            }
            None => hints.push(RepairHint {
                action,
                section: section.to_string(),
            }),
        }
    }
    hints
}

/// Apply hints and return a new artifact. The input is left untouched.
pub fn repair(
    artifact: &GeneratedArtifact,
    hints: &[RepairHint],
    ctx: &GenerationContext<'_>,
) -> Result<GeneratedArtifact> {
    let template = ctx.template();
    let vars = ctx.variables();
    let mut repaired = artifact.clone();

    for hint in hints {
        let Some(section_template) = template.section(&hint.section) else {
            // Not a section this tier defines; nothing to render it from.
            continue;
        };
        let existing = repaired
            .sections
            .iter()
            .position(|s| s.heading == hint.section);

        match (hint.action, existing) {
            (_, None) => {
                let body = render_section(template, section_template, &vars)?;
                let order = template.position(&hint.section);
                let at = repaired
                    .sections
                    .iter()
                    .position(|s| template.position(&s.heading) > order)
                    .unwrap_or(repaired.sections.len());
                repaired
                    .sections
                    .insert(at, ArtifactSection::new(section_template.heading, body));
            }
            (RepairAction::Rerender, Some(index)) => {
                repaired.sections[index].body =
                    render_section(template, section_template, &vars)?;
            }
            (RepairAction::Expand, Some(index)) => {
                let section = &mut repaired.sections[index];
                if !section.body.contains(section_template.expansion) {
                    section.body = format!(
                        "{}\n\n{}",
                        section.body.trim_end(),
                        section_template.expansion
                    );
                } else {
                    let extra: Vec<String> = ctx
                        .practices()
                        .into_iter()
                        .filter(|p| !section.body.contains(p.as_str()))
                        .map(|p| format!("- {p}"))
                        .collect();
                    if !extra.is_empty() {
                        section.body =
                            format!("{}\n\n{}", section.body.trim_end(), extra.join("\n"));
                    }
                }
            }
        }
    }
    Ok(repaired)
}
