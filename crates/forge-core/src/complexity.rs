//! Complexity scoring.
//!
//! `score = clamp(Σ capability weights + primary domain weight
//! + min(frameworks, 3), 1, 10)`. Pure and deterministic.

use crate::classify::Classification;
use crate::domain::{ComplexityScore, SignalSet};

/// Frameworks beyond this count add nothing to the score.
pub const FRAMEWORK_CAP: usize = 3;

/// Score a classification together with the signals it came from.
pub fn score(classification: &Classification, signals: &SignalSet) -> ComplexityScore {
    let capabilities: u32 = classification.capabilities.iter().map(|c| c.weight()).sum();
    let domain = classification.domain.primary_domain.complexity_weight();
    let frameworks = signals.framework_count().min(FRAMEWORK_CAP) as u32;
    ComplexityScore::clamped(capabilities + domain + frameworks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DomainClassification;
    use crate::domain::{Capability, CapabilitySet, Domain};

    fn classification(domain: Domain, caps: &[Capability]) -> Classification {
        Classification {
            domain: DomainClassification {
                primary_domain: domain,
                secondary_domains: Vec::new(),
                confidence: 1.0,
            },
            capabilities: caps.iter().copied().collect::<CapabilitySet>(),
        }
    }

    fn with_frameworks(names: &[&str]) -> SignalSet {
        let mut signals = SignalSet::default();
        for name in names {
            signals.add_framework(name);
        }
        signals
    }

    #[test]
    fn formatter_scores_two() {
        let c = classification(Domain::CodeQuality, &[Capability::Create]);
        assert_eq!(score(&c, &with_frameworks(&["black"])).value(), 2);
    }

    #[test]
    fn security_research_saturates_at_ten() {
        let c = classification(
            Domain::Security,
            &[Capability::Analyze, Capability::Research, Capability::Validate],
        );
        assert_eq!(score(&c, &with_frameworks(&["owasp"])).value(), 10);
    }

    #[test]
    fn empty_classification_is_clamped_to_one() {
        let c = classification(Domain::General, &[]);
        assert_eq!(score(&c, &SignalSet::default()).value(), 1);
    }

    #[test]
    fn framework_contribution_is_capped() {
        let c = classification(Domain::General, &[]);
        let s = with_frameworks(&["react", "jest", "playwright", "django", "axum"]);
        assert_eq!(score(&c, &s).value(), 3);
    }

    #[test]
    fn overflowing_sum_is_clamped_to_ten() {
        let c = classification(Domain::Security, &Capability::ALL);
        assert_eq!(score(&c, &with_frameworks(&["a", "b", "c"])).value(), 10);
    }
}
