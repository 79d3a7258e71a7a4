//! Structured lifecycle events for pipeline runs.
//!
//! Every event carries `event` and `run_id` fields so log pipelines can
//! stitch a run back together. Events are emitted at `info!` except
//! fallbacks and rejections, which are `warn!`.

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{ExecutionTier, GateResult};

/// Span covering one run. Attach it to async work with
/// [`tracing::Instrument::instrument`].
pub fn run_span(run_id: Uuid) -> tracing::Span {
    tracing::info_span!("forge.run", run_id = %run_id)
}

/// RAII guard that enters the run span on the current thread.
///
/// Not `Send`; use [`run_span`] across `.await` points.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: Uuid) -> Self {
        Self {
            _span: run_span(run_id).entered(),
        }
    }
}

pub fn emit_run_started(run_id: Uuid, request_chars: usize, speed_critical: bool) {
    info!(
        event = "run.started",
        run_id = %run_id,
        request_chars = request_chars,
        speed_critical = speed_critical,
    );
}

pub fn emit_run_classified(
    run_id: Uuid,
    primary_domain: &str,
    confidence: f32,
    capabilities: usize,
) {
    info!(
        event = "run.classified",
        run_id = %run_id,
        primary_domain = %primary_domain,
        confidence = confidence,
        capabilities = capabilities,
    );
}

pub fn emit_clarification_requested(run_id: Uuid, round: u8, questions: usize) {
    info!(
        event = "run.clarification_requested",
        run_id = %run_id,
        round = round,
        questions = questions,
    );
}

/// Evidence gathered. A fallback bundle is logged at `warn!`.
pub fn emit_evidence_gathered(
    run_id: Uuid,
    attempted: usize,
    succeeded: usize,
    quality_score: f32,
    is_fallback: bool,
) {
    if is_fallback {
        warn!(
            event = "evidence.gathered",
            run_id = %run_id,
            attempted = attempted,
            succeeded = succeeded,
            quality_score = quality_score,
            is_fallback = true,
        );
    } else {
        info!(
            event = "evidence.gathered",
            run_id = %run_id,
            attempted = attempted,
            succeeded = succeeded,
            quality_score = quality_score,
            is_fallback = false,
        );
    }
}

pub fn emit_gate_evaluated(run_id: Uuid, result: &GateResult) {
    info!(
        event = "gate.evaluated",
        run_id = %run_id,
        gate = %result.gate,
        passed = result.passed,
        issues = result.issues.len(),
        score = result.score,
    );
}

pub fn emit_repair_attempted(run_id: Uuid, attempt: u32, sections: usize) {
    info!(
        event = "run.repair_attempted",
        run_id = %run_id,
        attempt = attempt,
        sections = sections,
    );
}

/// Run finished. `status` is the outcome label; `tier` is absent when the
/// run stopped before planning.
pub fn emit_run_finished(
    run_id: Uuid,
    status: &str,
    tier: Option<ExecutionTier>,
    duration_ms: u64,
) {
    let tier = tier.map_or("none", ExecutionTier::as_str);
    if status == "REJECTED" {
        warn!(
            event = "run.finished",
            run_id = %run_id,
            status = %status,
            tier = %tier,
            duration_ms = duration_ms,
        );
    } else {
        info!(
            event = "run.finished",
            run_id = %run_id,
            status = %status,
            tier = %tier,
            duration_ms = duration_ms,
        );
    }
}
