//! Global atomic counters for pipeline runs.
//!
//! Counters are bumped silently where the event happens. Call
//! [`Metrics::flush`] to emit the current values as one `tracing::info!`
//! event.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    runs_started: AtomicU64,
    clarifications_issued: AtomicU64,
    evidence_fallbacks: AtomicU64,
    repairs_attempted: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            clarifications_issued: AtomicU64::new(0),
            evidence_fallbacks: AtomicU64::new(0),
            repairs_attempted: AtomicU64::new(0),
        }
    }

    pub fn inc_runs(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_started", "counter incremented");
    }

    /// Counts rounds, not questions.
    pub fn inc_clarifications(&self) {
        self.clarifications_issued.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "clarifications_issued", "counter incremented");
    }

    pub fn inc_evidence_fallbacks(&self) {
        self.evidence_fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "evidence_fallbacks", "counter incremented");
    }

    pub fn inc_repairs(&self) {
        self.repairs_attempted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "repairs_attempted", "counter incremented");
    }

    /// Emit all counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            runs_started = self.runs_started(),
            clarifications_issued = self.clarifications_issued(),
            evidence_fallbacks = self.evidence_fallbacks(),
            repairs_attempted = self.repairs_attempted(),
        );
    }

    pub fn runs_started(&self) -> u64 {
        self.runs_started.load(Ordering::Relaxed)
    }

    pub fn clarifications_issued(&self) -> u64 {
        self.clarifications_issued.load(Ordering::Relaxed)
    }

    pub fn evidence_fallbacks(&self) -> u64 {
        self.evidence_fallbacks.load(Ordering::Relaxed)
    }

    pub fn repairs_attempted(&self) -> u64 {
        self.repairs_attempted.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.runs_started.store(0, Ordering::Relaxed);
        self.clarifications_issued.store(0, Ordering::Relaxed);
        self.evidence_fallbacks.store(0, Ordering::Relaxed);
        self.repairs_attempted.store(0, Ordering::Relaxed);
    }
}
