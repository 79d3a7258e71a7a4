//! Validation report types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four validation gates, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    Syntax,
    Structure,
    Content,
    Quality,
}

impl GateName {
    pub const ORDER: [GateName; 4] = [
        GateName::Syntax,
        GateName::Structure,
        GateName::Content,
        GateName::Quality,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GateName::Syntax => "syntax",
            GateName::Structure => "structure",
            GateName::Content => "content",
            GateName::Quality => "quality",
        }
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a gate finding. Section-scoped kinds drive repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Metadata,
    MalformedSection,
    MissingField,
    MissingSection,
    Permission,
    TierMismatch,
    ThinSection,
    LowQuality,
}

/// One finding produced by a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateIssue {
    pub kind: IssueKind,
    pub message: String,
    /// Body section the finding refers to, when there is one.
    pub section: Option<String>,
}

impl GateIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            section: None,
        }
    }

    pub fn in_section(kind: IssueKind, section: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            section: Some(section.to_string()),
        }
    }
}

impl fmt::Display for GateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of a single gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub gate: GateName,
    pub passed: bool,
    pub issues: Vec<GateIssue>,
    /// Aggregate heuristic score, set by the quality gate only.
    pub score: Option<f32>,
}

impl GateResult {
    pub fn from_issues(gate: GateName, issues: Vec<GateIssue>) -> Self {
        Self {
            gate,
            passed: issues.is_empty(),
            issues,
            score: None,
        }
    }
}

/// Ordered gate results, populated up to and including the first failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub results: Vec<GateResult>,
    pub evaluated_at: DateTime<Utc>,
}

impl ValidationReport {
    /// True when every gate ran and passed.
    pub fn passed(&self) -> bool {
        self.results.len() == GateName::ORDER.len() && self.results.iter().all(|r| r.passed)
    }

    pub fn first_failure(&self) -> Option<&GateResult> {
        self.results.iter().find(|r| !r.passed)
    }

    pub fn gate(&self, name: GateName) -> Option<&GateResult> {
        self.results.iter().find(|r| r.gate == name)
    }

    /// Messages of the failing gate, in order.
    pub fn issue_messages(&self) -> Vec<String> {
        self.first_failure()
            .map(|r| r.issues.iter().map(|i| i.message.clone()).collect())
            .unwrap_or_default()
    }
}
