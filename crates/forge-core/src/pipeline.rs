//! Run orchestration: request in, validated artifact (or diagnostics) out.
//!
//! A run flows Interpreter → Classification → [clarification] → Scorer →
//! Planner → [evidence] → Generator → Validation, with bounded repair after
//! a failed validation. Clarification suspends the run into a
//! [`Continuation`] the caller hands back to [`Pipeline::resume`].
//!
//! The entry points never return an error. Terminal failures become a
//! `REJECTED` outcome carrying [`Diagnostics`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use crate::clarify::{
    apply_answers, next_round, questions_for, ClarificationQuestion, Continuation,
};
use crate::classify::{classify, Classification};
use crate::complexity;
use crate::config::{ForgeConfig, MAX_CLARIFICATION_ROUNDS, MAX_REPAIR_ATTEMPTS};
use crate::domain::{
    document_digest, ComplexityScore, Diagnostics, ForgeError, GeneratedArtifact, Request,
    Result, SignalSet, ValidationReport,
};
use crate::evidence::{EvidenceBundle, EvidenceGatherer, HttpKnowledgeSource, KnowledgeSource};
use crate::generator::{generate, plan_repair, repair, GenerationContext, RepairOutcome};
use crate::interpret::interpret;
use crate::metrics::METRICS;
use crate::obs::{self, RunSpan};
use crate::planner::{self, ResourcePlan};
use crate::validation::validate_document;

/// Final status of one `generate`/`resume` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Approved,
    Rejected,
    NeedsClarification,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Approved => "APPROVED",
            RunStatus::Rejected => "REJECTED",
            RunStatus::NeedsClarification => "NEEDS_CLARIFICATION",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a run produced, as far as it got.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_score: Option<ComplexityScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_plan: Option<ResourcePlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceBundle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<GeneratedArtifact>,
    /// SHA256 of the rendered artifact document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_report: Option<ValidationReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<ClarificationQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Continuation>,
    #[serde(default)]
    pub repair_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl GenerationOutcome {
    fn new(run_id: Uuid, status: RunStatus) -> Self {
        Self {
            run_id,
            status,
            classification: None,
            complexity_score: None,
            resource_plan: None,
            evidence: None,
            artifact: None,
            artifact_digest: None,
            validation_report: None,
            questions: Vec::new(),
            continuation: None,
            repair_attempts: 0,
            diagnostics: None,
        }
    }

    fn rejected(run_id: Uuid, err: &ForgeError) -> Self {
        Self {
            diagnostics: Some(Diagnostics::from(err)),
            ..Self::new(run_id, RunStatus::Rejected)
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == RunStatus::Approved
    }
}

/// Artifact after validation and any repairs.
struct Validated {
    artifact: GeneratedArtifact,
    /// Digest of the exact document the report was produced from.
    digest: String,
    report: ValidationReport,
    repair_attempts: u32,
}

/// The generation pipeline. Cheap to share; holds no per-run state.
#[derive(Clone)]
pub struct Pipeline {
    config: ForgeConfig,
    gatherer: EvidenceGatherer,
}

impl Pipeline {
    /// Pipeline without a knowledge source; research falls back to
    /// built-in practices.
    pub fn new(config: ForgeConfig) -> Self {
        let gatherer = EvidenceGatherer::new(None, config.evidence.clone());
        Self { config, gatherer }
    }

    pub fn with_knowledge_source(config: ForgeConfig, source: Arc<dyn KnowledgeSource>) -> Self {
        let gatherer = EvidenceGatherer::new(Some(source), config.evidence.clone());
        Self { config, gatherer }
    }

    /// Validate `config` and wire an HTTP knowledge source when an endpoint
    /// is configured.
    pub fn from_config(config: ForgeConfig) -> Result<Self> {
        config.validate()?;
        match config.evidence.endpoint.clone() {
            Some(endpoint) => {
                let source = HttpKnowledgeSource::new(&endpoint, config.evidence.fetch_timeout())?;
                Ok(Self::with_knowledge_source(config, Arc::new(source)))
            }
            None => Ok(Self::new(config)),
        }
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Configured round budget, never above [`MAX_CLARIFICATION_ROUNDS`]
    /// even for a config that skipped validation.
    fn max_rounds(&self) -> u8 {
        self.config
            .thresholds
            .max_clarification_rounds
            .min(MAX_CLARIFICATION_ROUNDS)
    }

    fn max_repairs(&self) -> u32 {
        self.config
            .thresholds
            .max_repair_attempts
            .min(MAX_REPAIR_ATTEMPTS)
    }

    /// Start a run for `raw_text`.
    pub async fn generate(
        &self,
        raw_text: &str,
        context: Option<&str>,
        speed_critical: bool,
    ) -> GenerationOutcome {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        METRICS.inc_runs();

        async {
            obs::emit_run_started(run_id, raw_text.chars().count(), speed_critical);
            let outcome = match Request::new(raw_text, context) {
                Ok(request) => {
                    let signals = interpret(&request);
                    self.advance(run_id, request, speed_critical, signals, 0).await
                }
                Err(err) => GenerationOutcome::rejected(run_id, &err),
            };
            finish(outcome, started)
        }
        .instrument(obs::run_span(run_id))
        .await
    }

    /// Resume a suspended run with one option index per pending question.
    pub async fn resume(&self, continuation: Continuation, answers: &[usize]) -> GenerationOutcome {
        let run_id = continuation.run_id;
        let started = Instant::now();

        async move {
            debug!(round = continuation.rounds, answers = answers.len(), "resuming run");
            let max_rounds = self.max_rounds();
            let outcome = match merge_answers(continuation, answers, max_rounds) {
                Ok(resumed) => {
                    self.advance(
                        run_id,
                        resumed.request,
                        resumed.speed_critical,
                        resumed.signals,
                        resumed.rounds,
                    )
                    .await
                }
                Err(err) => GenerationOutcome::rejected(run_id, &err),
            };
            finish(outcome, started)
        }
        .instrument(obs::run_span(run_id))
        .await
    }

    /// Abandon a suspended run.
    pub fn cancel(&self, continuation: &Continuation) -> GenerationOutcome {
        let _span = RunSpan::enter(continuation.run_id);
        let err = ForgeError::AmbiguityUnresolved {
            rounds: continuation.rounds,
        };
        finish(
            GenerationOutcome::rejected(continuation.run_id, &err),
            Instant::now(),
        )
    }

    async fn advance(
        &self,
        run_id: Uuid,
        request: Request,
        speed_critical: bool,
        signals: SignalSet,
        rounds: u8,
    ) -> GenerationOutcome {
        let thresholds = &self.config.thresholds;
        let classification = classify(&signals);
        obs::emit_run_classified(
            run_id,
            classification.domain.primary_domain.as_str(),
            classification.domain.confidence,
            classification.capabilities.len(),
        );

        let reasons = classification.escalation_reasons(thresholds.min_confidence);
        if !reasons.is_empty() {
            debug!(?reasons, "classification needs clarification");
            let round = match next_round(rounds, self.max_rounds()) {
                Ok(round) => round,
                Err(err) => {
                    return GenerationOutcome {
                        classification: Some(classification),
                        ..GenerationOutcome::rejected(run_id, &err)
                    };
                }
            };
            let questions = questions_for(&classification, &signals, thresholds.min_confidence);
            METRICS.inc_clarifications();
            obs::emit_clarification_requested(run_id, round, questions.len());
            let continuation = Continuation {
                run_id,
                request,
                speed_critical,
                signals,
                rounds: round,
                questions: questions.clone(),
            };
            return GenerationOutcome {
                classification: Some(classification),
                questions,
                continuation: Some(continuation),
                ..GenerationOutcome::new(run_id, RunStatus::NeedsClarification)
            };
        }

        let score = complexity::score(&classification, &signals);
        let plan = planner::plan(&classification, &signals, score, speed_critical);
        debug!(score = %score, tier = %plan.execution_tier, model = %plan.model, "run planned");

        let evidence = if plan.research_needed {
            let bundle = self.gatherer.gather(&classification, &signals).await;
            if bundle.is_fallback {
                METRICS.inc_evidence_fallbacks();
            }
            obs::emit_evidence_gathered(
                run_id,
                bundle.targets_attempted,
                bundle.targets_succeeded,
                bundle.quality_score,
                bundle.is_fallback,
            );
            Some(bundle)
        } else {
            None
        };

        let ctx = GenerationContext {
            classification: &classification,
            plan: &plan,
            score,
            frameworks: &signals.framework_tokens,
            evidence: evidence.as_ref(),
        };
        let built = self.generate_validated(run_id, &ctx);

        let mut outcome = GenerationOutcome {
            classification: Some(classification),
            complexity_score: Some(score),
            resource_plan: Some(plan),
            evidence,
            ..GenerationOutcome::new(run_id, RunStatus::Rejected)
        };
        match built {
            Ok(validated) => {
                outcome.repair_attempts = validated.repair_attempts;
                match validated.report.first_failure() {
                    Some(failed) => {
                        let err = ForgeError::ValidationFailure {
                            gate: failed.gate.to_string(),
                            issues: validated.report.issue_messages(),
                        };
                        warn!(
                            error = %err,
                            attempts = validated.repair_attempts,
                            "artifact rejected"
                        );
                        outcome.diagnostics = Some(Diagnostics::from(&err));
                    }
                    None => outcome.status = RunStatus::Approved,
                }
                outcome.artifact_digest = Some(validated.digest);
                outcome.artifact = Some(validated.artifact);
                outcome.validation_report = Some(validated.report);
            }
            Err(err) => {
                warn!(error = %err, "generation halted");
                outcome.diagnostics = Some(Diagnostics::from(&err));
            }
        }
        outcome
    }

    /// Generate, validate, and repair until the artifact passes or repair
    /// has nothing left to offer.
    fn generate_validated(&self, run_id: Uuid, ctx: &GenerationContext<'_>) -> Result<Validated> {
        let thresholds = &self.config.thresholds;
        let validation = ctx.validation_context();
        let mut artifact = generate(ctx)?;
        let mut attempts = 0;

        loop {
            let rendered = artifact.render()?;
            let report = validate_document(&rendered, Some(&validation), thresholds);
            for result in &report.results {
                obs::emit_gate_evaluated(run_id, result);
            }
            let Some(failed) = report.first_failure() else {
                return Ok(Validated {
                    artifact,
                    digest: document_digest(&rendered),
                    report,
                    repair_attempts: attempts,
                });
            };
            match plan_repair(failed, attempts, self.max_repairs()) {
                RepairOutcome::Planned { hints } => {
                    attempts += 1;
                    METRICS.inc_repairs();
                    obs::emit_repair_attempted(run_id, attempts, hints.len());
                    artifact = repair(&artifact, &hints, ctx)?;
                }
                RepairOutcome::NothingToRepair | RepairOutcome::ExhaustedAttempts { .. } => {
                    return Ok(Validated {
                        artifact,
                        digest: document_digest(&rendered),
                        report,
                        repair_attempts: attempts,
                    });
                }
            }
        }
    }
}

/// Revalidate the carried request and round counter, then merge the
/// answers into its signals.
fn merge_answers(
    mut continuation: Continuation,
    answers: &[usize],
    max_rounds: u8,
) -> Result<Continuation> {
    continuation.check_rounds(max_rounds)?;
    continuation.request = Request::new(
        continuation.request.raw_text(),
        continuation.request.context(),
    )?;
    apply_answers(&mut continuation.signals, &continuation.questions, answers)?;
    continuation.questions.clear();
    Ok(continuation)
}

fn finish(outcome: GenerationOutcome, started: Instant) -> GenerationOutcome {
    obs::emit_run_finished(
        outcome.run_id,
        outcome.status.as_str(),
        outcome.resource_plan.as_ref().map(|p| p.execution_tier),
        started.elapsed().as_millis() as u64,
    );
    outcome
}
