//! Placeholder resolution and artifact rendering.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::templates::{template_for, SectionTemplate, Template};
use crate::classify::{capability_phrase, Classification};
use crate::domain::{
    ArtifactSection, Capability, ComplexityScore, ForgeError, GeneratedArtifact, MetadataValue,
    Result,
};
use crate::evidence::EvidenceBundle;
use crate::lexicon::{domain_practices, GENERIC_PRACTICES};
use crate::planner::ResourcePlan;
use crate::validation::ValidationContext;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is a valid regex")
});

/// A resolved template variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    Text(String),
    Integer(i64),
    List(Vec<String>),
}

impl TemplateValue {
    fn inline(&self) -> String {
        match self {
            TemplateValue::Text(s) => s.clone(),
            TemplateValue::Integer(n) => n.to_string(),
            TemplateValue::List(items) if items.is_empty() => "none".to_string(),
            TemplateValue::List(items) => items.join(", "),
        }
    }

    fn bullets(&self) -> String {
        match self {
            TemplateValue::List(items) if items.is_empty() => "- none".to_string(),
            TemplateValue::List(items) => items
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.inline(),
        }
    }

    fn to_metadata(&self) -> MetadataValue {
        match self {
            TemplateValue::Text(s) => MetadataValue::Text(s.clone()),
            TemplateValue::Integer(n) => MetadataValue::Integer(*n),
            TemplateValue::List(items) => MetadataValue::List(items.clone()),
        }
    }
}

pub type Variables = BTreeMap<&'static str, TemplateValue>;

/// Everything a template may draw on for one run.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub classification: &'a Classification,
    pub plan: &'a ResourcePlan,
    pub score: ComplexityScore,
    pub frameworks: &'a [String],
    pub evidence: Option<&'a EvidenceBundle>,
}

impl GenerationContext<'_> {
    pub fn template(&self) -> &'static Template {
        template_for(self.plan.execution_tier)
    }

    /// Practices for the artifact: retrieved evidence first, then the
    /// primary domain's built-ins, then generic ones.
    pub fn practices(&self) -> Vec<String> {
        if let Some(bundle) = self.evidence.filter(|b| !b.practices.is_empty()) {
            return bundle.practices.clone();
        }
        let builtin = domain_practices(self.classification.domain.primary_domain);
        let source = if builtin.is_empty() {
            GENERIC_PRACTICES
        } else {
            builtin
        };
        source.iter().map(|p| p.to_string()).collect()
    }

    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            capabilities: self.classification.capabilities.clone(),
            complexity_score: self.score,
        }
    }

    pub fn variables(&self) -> Variables {
        let domain = &self.classification.domain;
        let capabilities = &self.classification.capabilities;
        let first_capability = capabilities
            .iter()
            .next()
            .map(Capability::as_str)
            .unwrap_or("assist");
        let phrase = capability_phrase(capabilities);

        let (research_sources, evidence_quality, evidence_mode) = match self.evidence {
            Some(bundle) if bundle.is_fallback => {
                (Vec::new(), format!("{:.2}", bundle.quality_score), "fallback")
            }
            Some(bundle) => (
                bundle.source_labels(),
                format!("{:.2}", bundle.quality_score),
                "retrieved",
            ),
            None => (Vec::new(), "n/a".to_string(), "not requested"),
        };

        let mut vars = Variables::new();
        vars.insert(
            "name",
            TemplateValue::Text(format!(
                "{}-{}-agent",
                domain.primary_domain.as_str().replace('_', "-"),
                first_capability
            )),
        );
        vars.insert(
            "description",
            TemplateValue::Text(format!(
                "Agent that can {phrase} in the {} domain.",
                domain.primary_domain.label()
            )),
        );
        vars.insert(
            "execution_tier",
            TemplateValue::Text(self.plan.execution_tier.as_str().to_string()),
        );
        vars.insert(
            "permission_set",
            TemplateValue::List(self.plan.permission_names()),
        );
        vars.insert("capabilities", TemplateValue::List(capabilities.names()));
        vars.insert("capability_summary", TemplateValue::Text(phrase));
        vars.insert(
            "primary_domain",
            TemplateValue::Text(domain.primary_domain.as_str().to_string()),
        );
        vars.insert(
            "domain_label",
            TemplateValue::Text(domain.primary_domain.label().to_string()),
        );
        vars.insert(
            "secondary_domains",
            TemplateValue::List(
                domain
                    .secondary_domains
                    .iter()
                    .map(|d| d.as_str().to_string())
                    .collect(),
            ),
        );
        vars.insert("frameworks", TemplateValue::List(self.frameworks.to_vec()));
        vars.insert(
            "knowledge_modules",
            TemplateValue::List(self.plan.knowledge_modules.clone()),
        );
        vars.insert(
            "complexity_score",
            TemplateValue::Integer(i64::from(self.score.value())),
        );
        vars.insert(
            "confidence",
            TemplateValue::Text(format!("{:.2}", domain.confidence)),
        );
        vars.insert("model", TemplateValue::Text(self.plan.model.to_string()));
        vars.insert("practices", TemplateValue::List(self.practices()));
        vars.insert("research_sources", TemplateValue::List(research_sources));
        vars.insert("evidence_quality", TemplateValue::Text(evidence_quality));
        vars.insert(
            "evidence_mode",
            TemplateValue::Text(evidence_mode.to_string()),
        );
        vars
    }
}

/// Render the tier's template for `ctx`.
pub fn generate(ctx: &GenerationContext<'_>) -> Result<GeneratedArtifact> {
    render_template(ctx.template(), &ctx.variables())
}

/// Render any template against a variable table.
///
/// Fails with `GeneratorDefect` on the first placeholder the table does not
/// define.
pub fn render_template(template: &Template, vars: &Variables) -> Result<GeneratedArtifact> {
    let mut metadata = BTreeMap::new();
    for (key, raw) in template.metadata {
        metadata.insert(key.to_string(), render_metadata(template, raw, vars)?);
    }

    let sections = template
        .sections
        .iter()
        .map(|section| {
            render_section(template, section, vars)
                .map(|body| ArtifactSection::new(section.heading, body))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GeneratedArtifact { metadata, sections })
}

/// Render one section body.
pub fn render_section(
    template: &Template,
    section: &SectionTemplate,
    vars: &Variables,
) -> Result<String> {
    render_text(template, section.body, vars)
}

/// Render free template text: whole-line list placeholders become bullets,
/// everything else is substituted inline.
fn render_text(template: &Template, text: &str, vars: &Variables) -> Result<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        match whole_placeholder(line.trim()) {
            Some(name) => lines.push(lookup(template, vars, name)?.bullets()),
            None => lines.push(substitute(template, line, vars)?),
        }
    }
    Ok(lines.join("\n"))
}

fn render_metadata(template: &Template, raw: &str, vars: &Variables) -> Result<MetadataValue> {
    match whole_placeholder(raw) {
        Some(name) => Ok(lookup(template, vars, name)?.to_metadata()),
        None => Ok(MetadataValue::Text(substitute(template, raw, vars)?)),
    }
}

/// The variable name when `text` is exactly one placeholder.
fn whole_placeholder(text: &str) -> Option<&str> {
    let caps = PLACEHOLDER.captures(text)?;
    let whole = caps.get(0)?;
    if whole.start() == 0 && whole.end() == text.len() {
        caps.get(1).map(|m| m.as_str())
    } else {
        None
    }
}

fn substitute(template: &Template, text: &str, vars: &Variables) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&lookup(template, vars, name.as_str())?.inline());
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn lookup<'v>(template: &Template, vars: &'v Variables, name: &str) -> Result<&'v TemplateValue> {
    vars.get(name).ok_or_else(|| ForgeError::GeneratorDefect {
        template: template.name().to_string(),
        placeholder: name.to_string(),
    })
}
