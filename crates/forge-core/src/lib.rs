//! Agent Forge Core Library
//!
//! Turns a short natural-language description of an automated worker into
//! a validated agent configuration document. [`Pipeline`] is the entry
//! point; the stages it drives are public for callers that need only part
//! of the flow.

pub mod clarify;
pub mod classify;
pub mod complexity;
pub mod config;
pub mod domain;
pub mod evidence;
pub mod generator;
pub mod interpret;
pub mod lexicon;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod planner;
pub mod telemetry;
pub mod validation;

pub use domain::{
    parse_document, ArtifactSection, Capability, CapabilitySet, ComplexityScore, Diagnostics,
    Domain, ExecutionTier, FailureKind, ForgeError, GateIssue, GateName, GateResult,
    GeneratedArtifact, IssueKind, MetadataValue, Permission, Request, Result, SignalSet,
    ValidationReport,
};

pub use clarify::{ClarificationQuestion, Continuation, QuestionKind};
pub use classify::{classify, Classification, DomainClassification, EscalationReason};
pub use config::{EvidenceConfig, ForgeConfig, Thresholds};
pub use evidence::{
    EvidenceBundle, EvidenceGatherer, HttpKnowledgeSource, KnowledgeError, KnowledgeSource,
    SourceRef,
};
pub use generator::{generate, template_for, GenerationContext};
pub use interpret::interpret;
pub use pipeline::{GenerationOutcome, Pipeline, RunStatus};
pub use planner::{plan, ModelProfile, ResourcePlan};
pub use validation::{validate_artifact, validate_document, ValidationContext};

pub use metrics::METRICS;
pub use obs::{run_span, RunSpan};
pub use telemetry::init_tracing;

/// Agent Forge version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
