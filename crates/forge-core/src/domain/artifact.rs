//! Generated artifact model and its document format.
//!
//! An artifact renders to a flat TOML front-matter block delimited by `+++`
//! followed by `## Heading` body sections:
//!
//! ```text
//! +++
//! name = "security-analyze-agent"
//! execution_tier = "T3"
//! permission_set = ["read", "search", "execute"]
//! +++
//!
//! ## Role
//!
//! ...
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::Result;
use super::report::{GateIssue, IssueKind};

/// Front-matter delimiter line.
pub const METADATA_DELIMITER: &str = "+++";

/// Heading marker for body sections.
pub const SECTION_MARKER: &str = "## ";

/// A flat metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            MetadataValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MetadataValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// One headed body section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSection {
    pub heading: String,
    pub body: String,
}

impl ArtifactSection {
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }
}

/// A generated agent configuration document.
///
/// Artifacts are values: repair produces a new artifact rather than editing
/// one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub metadata: BTreeMap<String, MetadataValue>,
    pub sections: Vec<ArtifactSection>,
}

impl GeneratedArtifact {
    pub fn section(&self, heading: &str) -> Option<&ArtifactSection> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    pub fn metadata_text(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_text)
    }

    /// Render to the `+++` front matter + `## Heading` document format.
    pub fn render(&self) -> Result<String> {
        let front = toml::to_string(&self.metadata)?;
        let mut out = String::with_capacity(front.len() + 256);
        out.push_str(METADATA_DELIMITER);
        out.push('\n');
        out.push_str(&front);
        if !front.is_empty() && !front.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(METADATA_DELIMITER);
        out.push('\n');
        for section in &self.sections {
            out.push('\n');
            out.push_str(SECTION_MARKER);
            out.push_str(&section.heading);
            out.push_str("\n\n");
            out.push_str(section.body.trim_end());
            out.push('\n');
        }
        Ok(out)
    }

    /// SHA256 hex digest of the rendered document.
    pub fn digest(&self) -> Result<String> {
        Ok(document_digest(&self.render()?))
    }
}

/// SHA256 hex digest of an already rendered document.
pub fn document_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Result of parsing a document: whatever could be recovered plus every
/// syntax finding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub metadata: Option<BTreeMap<String, MetadataValue>>,
    pub sections: Vec<ArtifactSection>,
    pub issues: Vec<GateIssue>,
}

impl ParsedDocument {
    pub fn is_well_formed(&self) -> bool {
        self.issues.is_empty() && self.metadata.is_some()
    }

    /// Convert into an artifact when the document is well formed.
    pub fn into_artifact(self) -> Option<GeneratedArtifact> {
        if !self.is_well_formed() {
            return None;
        }
        let metadata = self.metadata?;
        Some(GeneratedArtifact {
            metadata,
            sections: self.sections,
        })
    }
}

/// Parse a rendered artifact document.
pub fn parse_document(text: &str) -> ParsedDocument {
    let normalized = text.replace("\r\n", "\n");
    let mut lines = normalized.lines();
    let mut parsed = ParsedDocument::default();

    if lines.next().map(str::trim_end) != Some(METADATA_DELIMITER) {
        parsed.issues.push(GateIssue::new(
            IssueKind::Metadata,
            "metadata block must start with a +++ line",
        ));
        return parsed;
    }

    let mut front = Vec::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim_end() == METADATA_DELIMITER {
            closed = true;
            break;
        }
        front.push(line);
    }
    if !closed {
        parsed.issues.push(GateIssue::new(
            IssueKind::Metadata,
            "metadata block is not closed by a +++ line",
        ));
        return parsed;
    }

    parsed.metadata = parse_metadata(&front.join("\n"), &mut parsed.issues);
    parsed.sections = parse_sections(lines, &mut parsed.issues);
    parsed
}

fn parse_metadata(
    front: &str,
    issues: &mut Vec<GateIssue>,
) -> Option<BTreeMap<String, MetadataValue>> {
    let table = match toml::from_str::<toml::Table>(front) {
        Ok(table) => table,
        Err(e) => {
            issues.push(GateIssue::new(
                IssueKind::Metadata,
                format!("metadata is not valid key/value data: {}", e.message()),
            ));
            return None;
        }
    };

    let mut metadata = BTreeMap::new();
    for (key, value) in table {
        let converted = match value {
            toml::Value::String(s) => Some(MetadataValue::Text(s)),
            toml::Value::Integer(n) => Some(MetadataValue::Integer(n)),
            toml::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    toml::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(MetadataValue::List),
            _ => None,
        };
        match converted {
            Some(v) => {
                metadata.insert(key, v);
            }
            None => issues.push(GateIssue::new(
                IssueKind::Metadata,
                format!("metadata key '{key}' must be a string, integer or list of strings"),
            )),
        }
    }
    Some(metadata)
}

fn parse_sections<'a>(
    lines: impl Iterator<Item = &'a str>,
    issues: &mut Vec<GateIssue>,
) -> Vec<ArtifactSection> {
    let mut sections = Vec::new();
    let mut seen = HashSet::new();
    let mut current: Option<(String, Vec<&'a str>)> = None;

    for line in lines {
        if line == "##" || line.starts_with(SECTION_MARKER) {
            finish_section(current.take(), &mut sections, &mut seen, issues);
            let heading = line.trim_start_matches('#').trim();
            if heading.is_empty() {
                issues.push(GateIssue::new(
                    IssueKind::MalformedSection,
                    "empty section heading",
                ));
                continue;
            }
            current = Some((heading.to_string(), Vec::new()));
        } else if line.trim_end() == METADATA_DELIMITER {
            issues.push(GateIssue::new(
                IssueKind::Metadata,
                "unexpected metadata delimiter in body",
            ));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        } else if !line.trim().is_empty() {
            issues.push(GateIssue::new(
                IssueKind::MalformedSection,
                format!("content outside of a section: '{}'", line.trim()),
            ));
        }
    }
    finish_section(current, &mut sections, &mut seen, issues);
    sections
}

fn finish_section(
    current: Option<(String, Vec<&str>)>,
    sections: &mut Vec<ArtifactSection>,
    seen: &mut HashSet<String>,
    issues: &mut Vec<GateIssue>,
) {
    let Some((heading, body)) = current else {
        return;
    };
    let body = body.join("\n").trim().to_string();
    if body.is_empty() {
        issues.push(GateIssue::in_section(
            IssueKind::MalformedSection,
            &heading,
            format!("section '{heading}' has no body"),
        ));
    }
    if !seen.insert(heading.clone()) {
        issues.push(GateIssue::in_section(
            IssueKind::MalformedSection,
            &heading,
            format!("duplicate section: {heading}"),
        ));
        return;
    }
    sections.push(ArtifactSection::new(heading, body));
}
