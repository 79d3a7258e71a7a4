//! Pipeline configuration.
//!
//! Loaded from a TOML file, with every key optional and defaulted.
//! A missing file falls back to defaults. Two environment variables
//! override the file:
//!
//! - `FORGE_KNOWLEDGE_URL`: knowledge service base URL
//! - `FORGE_EVIDENCE_TIMEOUT_MS`: overall evidence deadline

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{ForgeError, Result};

pub const ENV_KNOWLEDGE_URL: &str = "FORGE_KNOWLEDGE_URL";
pub const ENV_EVIDENCE_TIMEOUT_MS: &str = "FORGE_EVIDENCE_TIMEOUT_MS";

/// Hard ceiling on clarification rounds per run.
pub const MAX_CLARIFICATION_ROUNDS: u8 = 2;

/// Hard ceiling on repair attempts per run.
pub const MAX_REPAIR_ATTEMPTS: u32 = 2;

/// Decision thresholds and retry bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Classification confidence below this escalates to clarification.
    pub min_confidence: f32,
    /// Minimum aggregate quality score.
    pub quality_min: f32,
    pub max_clarification_rounds: u8,
    pub max_repair_attempts: u32,
    /// Sections with fewer words count as thin.
    pub min_section_words: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_confidence: 0.2,
            quality_min: 0.7,
            max_clarification_rounds: MAX_CLARIFICATION_ROUNDS,
            max_repair_attempts: MAX_REPAIR_ATTEMPTS,
            min_section_words: 8,
        }
    }
}

/// Knowledge service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Base URL of the knowledge service. No endpoint means fallback evidence.
    pub endpoint: Option<String>,
    pub overall_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
    pub token_budget: u32,
    pub max_synonyms: usize,
    pub max_practices_per_source: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            overall_timeout_ms: 30_000,
            fetch_timeout_ms: 8_000,
            token_budget: 2_000,
            max_synonyms: 2,
            max_practices_per_source: 5,
        }
    }
}

impl EvidenceConfig {
    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub thresholds: Thresholds,
    pub evidence: EvidenceConfig,
}

impl ForgeConfig {
    /// Load from `path` (defaults when `None` or missing), apply environment
    /// overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                debug!(path = %p.display(), "loading config");
                Self::from_toml_str(&std::fs::read_to_string(p)?)?
            }
            Some(p) => {
                warn!(path = %p.display(), "config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML. Unset keys keep their defaults; the result is not yet
    /// validated.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply overrides from a variable lookup (`std::env::var` in production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_KNOWLEDGE_URL).filter(|u| !u.trim().is_empty()) {
            self.evidence.endpoint = Some(url.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_EVIDENCE_TIMEOUT_MS) {
            self.evidence.overall_timeout_ms = raw.trim().parse().map_err(|_| {
                ForgeError::Config(format!("{ENV_EVIDENCE_TIMEOUT_MS} is not an integer: {raw}"))
            })?;
        }
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        for (name, value) in [
            ("min_confidence", t.min_confidence),
            ("quality_min", t.quality_min),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ForgeError::Config(format!(
                    "thresholds.{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if t.max_clarification_rounds > MAX_CLARIFICATION_ROUNDS {
            return Err(ForgeError::Config(format!(
                "thresholds.max_clarification_rounds must be at most {MAX_CLARIFICATION_ROUNDS}, got {}",
                t.max_clarification_rounds
            )));
        }
        if t.max_repair_attempts > MAX_REPAIR_ATTEMPTS {
            return Err(ForgeError::Config(format!(
                "thresholds.max_repair_attempts must be at most {MAX_REPAIR_ATTEMPTS}, got {}",
                t.max_repair_attempts
            )));
        }

        let e = &self.evidence;
        for (name, value) in [
            ("overall_timeout_ms", e.overall_timeout_ms),
            ("fetch_timeout_ms", e.fetch_timeout_ms),
            ("token_budget", u64::from(e.token_budget)),
            ("max_practices_per_source", e.max_practices_per_source as u64),
        ] {
            if value == 0 {
                return Err(ForgeError::Config(format!(
                    "evidence.{name} must be positive"
                )));
            }
        }
        if let Some(endpoint) = &e.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ForgeError::Config(format!(
                    "evidence.endpoint must be an http(s) URL, got {endpoint}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let c = ForgeConfig::default();
        assert_eq!(c.thresholds.min_confidence, 0.2);
        assert_eq!(c.thresholds.quality_min, 0.7);
        assert_eq!(c.thresholds.max_clarification_rounds, 2);
        assert_eq!(c.thresholds.max_repair_attempts, 2);
        assert_eq!(c.evidence.overall_timeout(), Duration::from_secs(30));
        assert_eq!(c.evidence.fetch_timeout(), Duration::from_secs(8));
        assert!(c.evidence.endpoint.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let c = ForgeConfig::from_toml_str(
            "[thresholds]\nquality_min = 0.8\n\n[evidence]\nendpoint = \"http://localhost:9000\"\n",
        )
        .unwrap();
        assert_eq!(c.thresholds.quality_min, 0.8);
        assert_eq!(c.thresholds.min_section_words, 8);
        assert_eq!(c.evidence.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(c.evidence.token_budget, 2_000);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds]\nmax_repair_attempts = 1").unwrap();
        let c = ForgeConfig::load(Some(file.path())).unwrap();
        assert_eq!(c.thresholds.max_repair_attempts, 1);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = ForgeConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(c.thresholds, Thresholds::default());
    }

    #[test]
    fn env_overrides_apply() {
        let mut c = ForgeConfig::default();
        c.apply_env_overrides(|key| match key {
            ENV_KNOWLEDGE_URL => Some("https://kb.internal".to_string()),
            ENV_EVIDENCE_TIMEOUT_MS => Some("1500".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(c.evidence.endpoint.as_deref(), Some("https://kb.internal"));
        assert_eq!(c.evidence.overall_timeout_ms, 1_500);
    }

    #[test]
    fn non_numeric_timeout_override_is_a_config_error() {
        let mut c = ForgeConfig::default();
        let err = c
            .apply_env_overrides(|key| (key == ENV_EVIDENCE_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ForgeError::Config(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut c = ForgeConfig::default();
        c.thresholds.quality_min = 1.5;
        assert!(matches!(c.validate(), Err(ForgeError::Config(_))));

        let mut c = ForgeConfig::default();
        c.evidence.fetch_timeout_ms = 0;
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("fetch_timeout_ms"));

        let mut c = ForgeConfig::default();
        c.evidence.endpoint = Some("ftp://kb".to_string());
        assert!(c.validate().is_err());

        let mut c = ForgeConfig::default();
        c.thresholds.max_clarification_rounds = 3;
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("max_clarification_rounds"));

        let mut c = ForgeConfig::default();
        c.thresholds.max_repair_attempts = 5;
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("max_repair_attempts"));

        // Tighter budgets stay valid.
        let mut c = ForgeConfig::default();
        c.thresholds.max_clarification_rounds = 1;
        c.thresholds.max_repair_attempts = 0;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn oversized_round_budget_in_file_fails_to_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds]\nmax_clarification_rounds = 5").unwrap();
        assert!(matches!(
            ForgeConfig::load(Some(file.path())),
            Err(ForgeError::Config(_))
        ));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            ForgeConfig::from_toml_str("[thresholds\n"),
            Err(ForgeError::TomlDe(_))
        ));
    }
}
