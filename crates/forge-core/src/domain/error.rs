//! Error taxonomy for Agent Forge.
//!
//! Library functions return [`ForgeError`]. The pipeline entry points never
//! surface these directly: terminal failures are folded into a
//! [`Diagnostics`] value carried by the outcome.

use serde::{Deserialize, Serialize};

/// Agent Forge errors.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("ambiguity unresolved after {rounds} clarification round(s)")]
    AmbiguityUnresolved { rounds: u8 },

    #[error("evidence unavailable: {0}")]
    EvidenceUnavailable(String),

    #[error("generator defect in template {template}: unresolved placeholder {{{{{placeholder}}}}}")]
    GeneratorDefect {
        template: String,
        placeholder: String,
    },

    #[error("validation failed at gate {gate}: {issues:?}")]
    ValidationFailure { gate: String, issues: Vec<String> },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("metadata parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("metadata render error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Agent Forge operations.
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Coarse kind of a terminal failure, reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidRequest,
    AmbiguityUnresolved,
    GeneratorDefect,
    ValidationFailure,
    Internal,
}

/// Structured diagnostics attached to every rejected outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub kind: FailureKind,
    pub issues: Vec<String>,
}

impl Diagnostics {
    pub fn new(kind: FailureKind, issues: Vec<String>) -> Self {
        Self { kind, issues }
    }
}

impl From<&ForgeError> for Diagnostics {
    fn from(err: &ForgeError) -> Self {
        let kind = match err {
            ForgeError::InvalidRequest(_) => FailureKind::InvalidRequest,
            ForgeError::AmbiguityUnresolved { .. } => FailureKind::AmbiguityUnresolved,
            ForgeError::GeneratorDefect { .. } => FailureKind::GeneratorDefect,
            ForgeError::ValidationFailure { .. } => FailureKind::ValidationFailure,
            _ => FailureKind::Internal,
        };
        let issues = match err {
            ForgeError::ValidationFailure { issues, .. } => issues.clone(),
            other => vec![other.to_string()],
        };
        Self { kind, issues }
    }
}
