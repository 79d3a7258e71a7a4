//! Artifact generator.
//!
//! Renders the tier's static template against a [`GenerationContext`] and
//! repairs rejected artifacts section by section.

mod render;
mod repair;
pub mod templates;

pub use render::{
    generate, render_section, render_template, GenerationContext, TemplateValue, Variables,
};
pub use repair::{hints_for, plan_repair, repair, RepairAction, RepairHint, RepairOutcome};
pub use templates::{template_for, SectionTemplate, Template};
