//! Static artifact templates, one per execution tier.
//!
//! Bodies use `{{placeholder}}` variables. A placeholder alone on a line
//! expands a list into bullets; inline, a list is comma-joined.

use crate::domain::ExecutionTier;

/// One body section of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionTemplate {
    pub heading: &'static str,
    pub body: &'static str,
    /// Appended when validation reports the section as thin.
    pub expansion: &'static str,
}

/// Metadata keys and ordered sections for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub tier: ExecutionTier,
    pub metadata: &'static [(&'static str, &'static str)],
    pub sections: &'static [SectionTemplate],
}

impl Template {
    pub fn name(&self) -> &'static str {
        self.tier.as_str()
    }

    pub fn section(&self, heading: &str) -> Option<&'static SectionTemplate> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    /// Position of `heading` in the template's section order.
    pub fn position(&self, heading: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.heading == heading)
    }

    pub fn required_sections(&self) -> Vec<&'static str> {
        self.sections.iter().map(|s| s.heading).collect()
    }
}

pub fn template_for(tier: ExecutionTier) -> &'static Template {
    match tier {
        ExecutionTier::T1 => &T1_TEMPLATE,
        ExecutionTier::T2 => &T2_TEMPLATE,
        ExecutionTier::T3 => &T3_TEMPLATE,
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

const T1_METADATA: &[(&str, &str)] = &[
    ("name", "{{name}}"),
    ("description", "{{description}}"),
    ("execution_tier", "{{execution_tier}}"),
    ("permission_set", "{{permission_set}}"),
    ("capabilities", "{{capabilities}}"),
    ("complexity_score", "{{complexity_score}}"),
    ("primary_domain", "{{primary_domain}}"),
    ("model", "{{model}}"),
];

const T2_METADATA: &[(&str, &str)] = &[
    ("name", "{{name}}"),
    ("description", "{{description}}"),
    ("execution_tier", "{{execution_tier}}"),
    ("permission_set", "{{permission_set}}"),
    ("capabilities", "{{capabilities}}"),
    ("complexity_score", "{{complexity_score}}"),
    ("primary_domain", "{{primary_domain}}"),
    ("model", "{{model}}"),
    ("knowledge_modules", "{{knowledge_modules}}"),
];

const T3_METADATA: &[(&str, &str)] = &[
    ("name", "{{name}}"),
    ("description", "{{description}}"),
    ("execution_tier", "{{execution_tier}}"),
    ("permission_set", "{{permission_set}}"),
    ("capabilities", "{{capabilities}}"),
    ("complexity_score", "{{complexity_score}}"),
    ("primary_domain", "{{primary_domain}}"),
    ("model", "{{model}}"),
    ("knowledge_modules", "{{knowledge_modules}}"),
    ("research_sources", "{{research_sources}}"),
    ("secondary_domains", "{{secondary_domains}}"),
];

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

const ROLE: SectionTemplate = SectionTemplate {
    heading: "Role",
    body: "You are {{name}}. You work in the {{domain_label}} domain. \
{{description}} Keep every answer focused on the task you were given.",
    expansion: "Stay inside the stated domain and capabilities. \
Hand off any work that falls outside them.",
};

const CAPABILITIES: SectionTemplate = SectionTemplate {
    heading: "Capabilities",
    body: "You are expected to {{capability_summary}}. \
Use only the capabilities listed below.\n\n{{capabilities}}",
    expansion: "Decline tasks that need a capability missing from this list. \
Explain which capability would be required.",
};

const WORKFLOW: SectionTemplate = SectionTemplate {
    heading: "Workflow",
    body: "Follow these steps in order for every task.\n\n\
1. Read the request and the relevant files before acting.\n\
2. Plan the smallest change that meets the request.\n\
3. Carry out the plan with the permitted tools.\n\
4. Check the result and report what changed.",
    expansion: "Repeat the check step after every fix. \
Stop once the result matches the request.",
};

const DEEP_WORKFLOW: SectionTemplate = SectionTemplate {
    heading: "Workflow",
    body: "Follow these steps in order for every task.\n\n\
1. Read the request, the relevant files and the loaded knowledge.\n\
2. Review the research evidence and note which practices apply.\n\
3. Plan the change and list the risks you expect.\n\
4. Carry out the plan in small, verifiable steps.\n\
5. Check every result against the quality checks.\n\
6. Report what changed and which practices you applied.",
    expansion: "Record each decision with the evidence behind it. \
Revisit the plan when a step fails.",
};

const KNOWLEDGE: SectionTemplate = SectionTemplate {
    heading: "Knowledge",
    body: "Load these knowledge modules before starting work. \
Prefer their guidance over general habits.\n\n{{knowledge_modules}}\n\n\
Frameworks in scope: {{frameworks}}.",
    expansion: "Consult the matching module whenever a question comes up. \
Cite the module you relied on in your report.",
};

const QUALITY_CHECKS: SectionTemplate = SectionTemplate {
    heading: "Quality Checks",
    body: "Before reporting success, confirm each point below.\n\n\
- The change matches the request and nothing more.\n\
- Existing checks and tests still pass.\n\
- New behavior is covered by a check.\n\
- The report names every file that changed.",
    expansion: "Run the checks again after any late edit. \
Report a failed check instead of hiding it.",
};

const RESEARCH_EVIDENCE: SectionTemplate = SectionTemplate {
    heading: "Research Evidence",
    body: "Evidence mode: {{evidence_mode}}. Evidence quality: {{evidence_quality}}. \
Sources consulted: {{research_sources}}.\n\n\
Apply these practices where they fit the task.\n\n{{practices}}",
    expansion: "Treat low-quality evidence as a hint, not a rule. \
Confirm each practice against the project before applying it.",
};

const ESCALATION: SectionTemplate = SectionTemplate {
    heading: "Escalation",
    body: "Stop and ask the requester when the task is unclear. \
Use interactive clarification before any destructive step. \
Report blockers together with the evidence you found. \
The request was classified with confidence {{confidence}}.",
    expansion: "Never guess at credentials, secrets or production settings. \
Wait for an explicit answer before continuing.",
};

const CONSTRAINTS: SectionTemplate = SectionTemplate {
    heading: "Constraints",
    body: "Use only the tools granted by this permission set. \
Ask before acting outside this scope.\n\n{{permission_set}}\n\n\
Follow these working practices.\n\n{{practices}}",
    expansion: "Leave unrelated files untouched. \
Keep changes reversible wherever possible.",
};

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub static T1_TEMPLATE: Template = Template {
    tier: ExecutionTier::T1,
    metadata: T1_METADATA,
    sections: &[ROLE, CAPABILITIES, WORKFLOW, CONSTRAINTS],
};

pub static T2_TEMPLATE: Template = Template {
    tier: ExecutionTier::T2,
    metadata: T2_METADATA,
    sections: &[
        ROLE,
        CAPABILITIES,
        KNOWLEDGE,
        WORKFLOW,
        QUALITY_CHECKS,
        CONSTRAINTS,
    ],
};

pub static T3_TEMPLATE: Template = Template {
    tier: ExecutionTier::T3,
    metadata: T3_METADATA,
    sections: &[
        ROLE,
        CAPABILITIES,
        KNOWLEDGE,
        RESEARCH_EVIDENCE,
        DEEP_WORKFLOW,
        QUALITY_CHECKS,
        ESCALATION,
        CONSTRAINTS,
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_extend_each_other() {
        let t1 = template_for(ExecutionTier::T1).required_sections();
        let t2 = template_for(ExecutionTier::T2).required_sections();
        let t3 = template_for(ExecutionTier::T3).required_sections();
        assert_eq!(t1, vec!["Role", "Capabilities", "Workflow", "Constraints"]);
        for heading in &t1 {
            assert!(t2.contains(heading));
        }
        for heading in &t2 {
            assert!(t3.contains(heading));
        }
        assert!(t2.contains(&"Knowledge") && t2.contains(&"Quality Checks"));
        assert!(t3.contains(&"Research Evidence") && t3.contains(&"Escalation"));
    }

    #[test]
    fn every_template_declares_required_metadata() {
        for tier in [ExecutionTier::T1, ExecutionTier::T2, ExecutionTier::T3] {
            let keys: Vec<&str> = template_for(tier).metadata.iter().map(|(k, _)| *k).collect();
            for required in ["name", "execution_tier", "permission_set"] {
                assert!(keys.contains(&required), "{tier} lacks {required}");
            }
        }
    }

    #[test]
    fn headings_are_unique() {
        for tier in [ExecutionTier::T1, ExecutionTier::T2, ExecutionTier::T3] {
            let mut headings = template_for(tier).required_sections();
            let total = headings.len();
            headings.sort();
            headings.dedup();
            assert_eq!(headings.len(), total);
        }
    }
}
