//! Bounded classification space: domains, capabilities, permissions, tiers.
//!
//! Weights and permission tables live on the enums so they are plain
//! constant data, shared read-only by every pipeline run.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ForgeError, Result};

/// Problem domain an agent works in.
///
/// Variant order is the fixed tie-break priority: when two domains carry the
/// same weight, the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Security,
    Backend,
    Frontend,
    Database,
    DevOps,
    Testing,
    Data,
    Mobile,
    CodeQuality,
    Documentation,
    General,
}

impl Domain {
    /// All domains in tie-break priority order.
    pub const ALL: [Domain; 11] = [
        Domain::Security,
        Domain::Backend,
        Domain::Frontend,
        Domain::Database,
        Domain::DevOps,
        Domain::Testing,
        Domain::Data,
        Domain::Mobile,
        Domain::CodeQuality,
        Domain::Documentation,
        Domain::General,
    ];

    /// Domains a requester may pick during clarification.
    pub const CLARIFIABLE: [Domain; 10] = [
        Domain::Security,
        Domain::Backend,
        Domain::Frontend,
        Domain::Database,
        Domain::DevOps,
        Domain::Testing,
        Domain::Data,
        Domain::Mobile,
        Domain::CodeQuality,
        Domain::Documentation,
    ];

    /// Position in the tie-break order (lower wins).
    pub fn priority(self) -> usize {
        Self::ALL.iter().position(|d| *d == self).unwrap_or(Self::ALL.len())
    }

    /// Contribution of the primary domain to the complexity score.
    pub fn complexity_weight(self) -> u32 {
        match self {
            Domain::Security => 3,
            Domain::Backend | Domain::Database | Domain::DevOps => 2,
            Domain::Frontend | Domain::Testing | Domain::Data | Domain::Mobile => 1,
            Domain::CodeQuality | Domain::Documentation | Domain::General => 0,
        }
    }

    /// Permissions an agent in this domain needs beyond the baseline.
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Domain::Security => &[Execute, Network],
            Domain::Backend | Domain::Frontend | Domain::Database => &[Write, Execute],
            Domain::DevOps => &[Write, Execute, Network],
            Domain::Testing | Domain::Data | Domain::Mobile => &[Write, Execute],
            Domain::CodeQuality => &[Execute],
            Domain::Documentation => &[Write],
            Domain::General => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Security => "security",
            Domain::Backend => "backend",
            Domain::Frontend => "frontend",
            Domain::Database => "database",
            Domain::DevOps => "devops",
            Domain::Testing => "testing",
            Domain::Data => "data",
            Domain::Mobile => "mobile",
            Domain::CodeQuality => "code_quality",
            Domain::Documentation => "documentation",
            Domain::General => "general",
        }
    }

    /// Human-facing label used in questions and research lookups.
    pub fn label(self) -> &'static str {
        match self {
            Domain::CodeQuality => "code quality",
            Domain::DevOps => "DevOps",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an agent is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Create,
    Analyze,
    Optimize,
    Research,
    Validate,
    Monitor,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::Create,
        Capability::Analyze,
        Capability::Optimize,
        Capability::Research,
        Capability::Validate,
        Capability::Monitor,
    ];

    /// Contribution to the complexity score.
    pub fn weight(self) -> u32 {
        match self {
            Capability::Create => 1,
            Capability::Analyze | Capability::Optimize => 2,
            Capability::Research => 3,
            Capability::Validate | Capability::Monitor => 1,
        }
    }

    /// Permissions required to exercise this capability.
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Capability::Create | Capability::Optimize => &[Write],
            Capability::Analyze => &[],
            Capability::Research | Capability::Monitor => &[Network],
            Capability::Validate => &[Execute],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Create => "create",
            Capability::Analyze => "analyze",
            Capability::Optimize => "optimize",
            Capability::Research => "research",
            Capability::Validate => "validate",
            Capability::Monitor => "monitor",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ForgeError::InvalidRequest(format!("unknown capability: {s}")))
    }
}

/// Ordered set of capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, capability: Capability) -> bool {
        self.0.insert(capability)
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Tool permission granted to a generated agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Search,
    Write,
    Execute,
    Network,
    InteractiveClarify,
}

impl Permission {
    /// Every agent gets these.
    pub const BASELINE: [Permission; 2] = [Permission::Read, Permission::Search];

    pub const ALL: [Permission; 6] = [
        Permission::Read,
        Permission::Search,
        Permission::Write,
        Permission::Execute,
        Permission::Network,
        Permission::InteractiveClarify,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Search => "search",
            Permission::Write => "write",
            Permission::Execute => "execute",
            Permission::Network => "network",
            Permission::InteractiveClarify => "interactive_clarify",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ForgeError::InvalidRequest(format!("unknown permission: {s}")))
    }
}

/// Complexity band governing template choice and resource scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExecutionTier {
    T1,
    T2,
    T3,
}

impl ExecutionTier {
    /// Fixed buckets: 1–3 → T1, 4–6 → T2, 7–10 → T3.
    pub fn for_score(score: ComplexityScore) -> Self {
        match score.value() {
            0..=3 => ExecutionTier::T1,
            4..=6 => ExecutionTier::T2,
            _ => ExecutionTier::T3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionTier::T1 => "T1",
            ExecutionTier::T2 => "T2",
            ExecutionTier::T3 => "T3",
        }
    }
}

impl fmt::Display for ExecutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionTier {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "T1" => Ok(ExecutionTier::T1),
            "T2" => Ok(ExecutionTier::T2),
            "T3" => Ok(ExecutionTier::T3),
            other => Err(ForgeError::InvalidRequest(format!(
                "unknown execution tier: {other}"
            ))),
        }
    }
}

/// Integer complexity estimate, always within `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ComplexityScore(u8);

impl ComplexityScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Clamp an arbitrary raw sum into the valid range.
    pub fn clamped(raw: u32) -> Self {
        Self(raw.clamp(Self::MIN as u32, Self::MAX as u32) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ComplexityScore {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("complexity score {value} outside 1..=10"))
        }
    }
}

impl From<ComplexityScore> for u8 {
    fn from(score: ComplexityScore) -> Self {
        score.0
    }
}

impl fmt::Display for ComplexityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_buckets_cover_every_score() {
        for raw in 1..=10u8 {
            let score = ComplexityScore::try_from(raw).unwrap();
            let expected = match raw {
                1..=3 => ExecutionTier::T1,
                4..=6 => ExecutionTier::T2,
                _ => ExecutionTier::T3,
            };
            assert_eq!(ExecutionTier::for_score(score), expected, "score {raw}");
        }
    }

    #[test]
    fn clamped_score_stays_in_range() {
        assert_eq!(ComplexityScore::clamped(0).value(), 1);
        assert_eq!(ComplexityScore::clamped(7).value(), 7);
        assert_eq!(ComplexityScore::clamped(42).value(), 10);
    }

    #[test]
    fn score_rejects_out_of_range_deserialization() {
        assert!(serde_json::from_str::<ComplexityScore>("0").is_err());
        assert!(serde_json::from_str::<ComplexityScore>("11").is_err());
        assert_eq!(
            serde_json::from_str::<ComplexityScore>("4").unwrap().value(),
            4
        );
    }

    #[test]
    fn domain_priority_follows_declaration_order() {
        assert!(Domain::Security.priority() < Domain::Backend.priority());
        assert!(Domain::Documentation.priority() < Domain::General.priority());
        assert_eq!(Domain::General.priority(), Domain::ALL.len() - 1);
    }

    #[test]
    fn tier_and_permission_names_roundtrip() {
        for tier in [ExecutionTier::T1, ExecutionTier::T2, ExecutionTier::T3] {
            assert_eq!(tier.as_str().parse::<ExecutionTier>().unwrap(), tier);
        }
        for perm in Permission::ALL {
            assert_eq!(perm.as_str().parse::<Permission>().unwrap(), perm);
        }
        assert!("admin".parse::<Permission>().is_err());
    }

    #[test]
    fn tier_serializes_as_label() {
        assert_eq!(serde_json::to_string(&ExecutionTier::T2).unwrap(), "\"T2\"");
    }
}
