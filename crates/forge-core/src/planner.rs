//! Resource planner: tier, permissions, knowledge modules and research flag.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::domain::{Capability, ComplexityScore, ExecutionTier, Permission, SignalSet};
use crate::lexicon::{capability_modules, domain_modules, framework_module};

/// Worker model profile chosen for the generated agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProfile {
    Fast,
    Balanced,
    Deep,
}

impl ModelProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelProfile::Fast => "fast",
            ModelProfile::Balanced => "balanced",
            ModelProfile::Deep => "deep",
        }
    }
}

impl fmt::Display for ModelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the generated agent is allowed and expected to use.
///
/// # Invariants
///
/// `permission_set` always contains [`Permission::BASELINE`], and
/// `execution_tier` is always `ExecutionTier::for_score` of the score the
/// plan was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePlan {
    pub execution_tier: ExecutionTier,
    pub permission_set: BTreeSet<Permission>,
    /// De-duplicated, in load order.
    pub knowledge_modules: Vec<String>,
    pub research_needed: bool,
    pub model: ModelProfile,
}

impl ResourcePlan {
    pub fn permission_names(&self) -> Vec<String> {
        self.permission_set
            .iter()
            .map(|p| p.as_str().to_string())
            .collect()
    }
}

/// Build the resource plan. Infallible.
pub fn plan(
    classification: &Classification,
    signals: &SignalSet,
    score: ComplexityScore,
    speed_critical: bool,
) -> ResourcePlan {
    let execution_tier = ExecutionTier::for_score(score);
    let primary = classification.domain.primary_domain;

    let mut permission_set: BTreeSet<Permission> = Permission::BASELINE.into_iter().collect();
    permission_set.extend(primary.permissions().iter().copied());
    for capability in classification.capabilities.iter() {
        permission_set.extend(capability.permissions().iter().copied());
    }
    if execution_tier == ExecutionTier::T3 {
        permission_set.insert(Permission::InteractiveClarify);
    }

    let mut knowledge_modules: Vec<String> = Vec::new();
    let mut push = |module: String| {
        if !knowledge_modules.contains(&module) {
            knowledge_modules.push(module);
        }
    };
    for module in domain_modules(primary) {
        push(module.to_string());
    }
    for domain in &classification.domain.secondary_domains {
        for module in domain_modules(*domain) {
            push(module.to_string());
        }
    }
    for capability in classification.capabilities.iter() {
        for module in capability_modules(capability) {
            push(module.to_string());
        }
    }
    for framework in &signals.framework_tokens {
        push(framework_module(framework));
    }

    let research_needed = classification.capabilities.contains(Capability::Research)
        || (execution_tier == ExecutionTier::T3 && !speed_critical);

    let model = match execution_tier {
        _ if speed_critical => ModelProfile::Fast,
        ExecutionTier::T1 => ModelProfile::Fast,
        ExecutionTier::T2 => ModelProfile::Balanced,
        ExecutionTier::T3 => ModelProfile::Deep,
    };

    ResourcePlan {
        execution_tier,
        permission_set,
        knowledge_modules,
        research_needed,
        model,
    }
}
