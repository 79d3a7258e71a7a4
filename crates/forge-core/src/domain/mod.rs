//! Domain models for Agent Forge.
//!
//! Canonical definitions for the core entities:
//! - `Request` / `SignalSet`: pipeline input and extracted signals
//! - `Domain`, `Capability`, `Permission`, `ExecutionTier`: the bounded taxonomy
//! - `GeneratedArtifact`: the rendered agent configuration
//! - `ValidationReport`: gate results

pub mod artifact;
pub mod error;
pub mod report;
pub mod request;
pub mod taxonomy;

pub use artifact::{
    document_digest, parse_document, ArtifactSection, GeneratedArtifact, MetadataValue, ParsedDocument,
    METADATA_DELIMITER, SECTION_MARKER,
};
pub use error::{Diagnostics, FailureKind, ForgeError, Result};
pub use report::{GateIssue, GateName, GateResult, IssueKind, ValidationReport};
pub use request::{CapabilityToken, DomainToken, Request, SignalSet, MAX_REQUEST_CHARS};
pub use taxonomy::{
    Capability, CapabilitySet, ComplexityScore, Domain, ExecutionTier, Permission,
};
