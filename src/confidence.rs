//! Confidence score for proceeding with a test
//!
//! A deterministic heuristic, not a calibrated probability: start at 1.0 and
//! shrink by a golden-ratio penalty per violation. It communicates "how much
//! is wrong" on a single scale; the `can_proceed` decision never depends on
//! it.
//!
//! | Severity | Multiplier |
//! |----------|------------|
//! | critical | 1/φ² ≈ 0.382 |
//! | warning  | 1/φ ≈ 0.618 |
//! | info     | 1 |

use crate::validators::{AssumptionCheck, Severity};

/// Golden ratio φ
pub const PHI: f64 = 1.618_033_988_7;

/// Multiplier applied for one violation of the given severity
pub fn penalty(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 1.0 / (PHI * PHI),
        Severity::Warning => 1.0 / PHI,
        Severity::Info | Severity::None => 1.0,
    }
}

/// Score in [0, 1]; 1.0 when nothing is violated
pub fn confidence_score<'a, I>(checks: I) -> f64
where
    I: IntoIterator<Item = &'a AssumptionCheck>,
{
    checks
        .into_iter()
        .filter(|c| c.violated)
        .map(|c| penalty(c.severity))
        .product::<f64>()
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::Assumption;

    fn violation(severity: Severity) -> AssumptionCheck {
        AssumptionCheck::violation(Assumption::Outliers, severity, "", "")
    }

    #[test]
    fn test_no_violations_is_full_confidence() {
        assert_eq!(confidence_score(&Vec::<AssumptionCheck>::new()), 1.0);
        let ok = AssumptionCheck::satisfied(Assumption::Normality, "");
        assert_eq!(confidence_score(&[ok]), 1.0);
    }

    #[test]
    fn test_penalties() {
        let c = confidence_score(&[violation(Severity::Critical)]);
        assert!((c - 0.381_966).abs() < 1e-6);
        let w = confidence_score(&[violation(Severity::Warning)]);
        assert!((w - 0.618_034).abs() < 1e-6);
        assert_eq!(confidence_score(&[violation(Severity::Info)]), 1.0);
    }

    #[test]
    fn test_monotonically_non_increasing() {
        let mut checks = Vec::new();
        let mut previous = confidence_score(&checks);
        for severity in [
            Severity::Info,
            Severity::Warning,
            Severity::Critical,
            Severity::Warning,
            Severity::Critical,
        ] {
            checks.push(violation(severity));
            let current = confidence_score(&checks);
            assert!(current <= previous);
            assert!((0.0..=1.0).contains(&current));
            previous = current;
        }
    }

    #[test]
    fn test_critical_weighs_more_than_warning() {
        assert!(penalty(Severity::Critical) < penalty(Severity::Warning));
    }
}
