// Sample-size adequacy
//
// Two tiers per test, both fixed by the registry:
// - minimum: below it the test cannot produce valid inference (critical)
// - recommended: below it the test runs but with low power (advisory only)

use super::{Assumption, AssumptionCheck, Severity, Validator};
use crate::dataset::Dataset;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Per-test sample-size thresholds, applied to the smallest group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRequirement {
    pub minimum: usize,
    pub recommended: usize,
}

impl Default for SampleRequirement {
    fn default() -> Self {
        Self {
            minimum: 3,
            recommended: 20,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SampleSizeValidator {
    requirement: SampleRequirement,
}

impl SampleSizeValidator {
    pub fn new(requirement: SampleRequirement) -> Self {
        Self { requirement }
    }
}

impl Validator for SampleSizeValidator {
    fn assumption(&self) -> Assumption {
        Assumption::SampleSize
    }

    fn check(&self, data: &Dataset, _alpha: f64) -> Result<AssumptionCheck> {
        let n = data.min_group_len();
        let SampleRequirement {
            minimum,
            recommended,
        } = self.requirement;
        let scope = if data.group_count() > 1 {
            "smallest group"
        } else {
            "sample"
        };

        let check = if n < minimum {
            AssumptionCheck::violation(
                Assumption::SampleSize,
                Severity::Critical,
                format!("{} has n={}, below the minimum of {}", scope, n, minimum),
                format!("Collect at least {} observations per group", minimum),
            )
        } else if n < recommended {
            AssumptionCheck::satisfied(
                Assumption::SampleSize,
                format!(
                    "{} has n={} (minimum {}, recommended {})",
                    scope, n, minimum, recommended
                ),
            )
            .with_advisory(format!(
                "Low statistical power: {} has n={} below the recommended {}; \
                 non-significant results should not be read as evidence of no effect",
                scope, n, recommended
            ))
        } else {
            AssumptionCheck::satisfied(
                Assumption::SampleSize,
                format!("{} has n={} (recommended {})", scope, n, recommended),
            )
        };
        Ok(check.with_statistic(n as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement() -> SampleRequirement {
        SampleRequirement {
            minimum: 3,
            recommended: 20,
        }
    }

    #[test]
    fn test_below_minimum_is_critical() {
        let ds = Dataset::from_groups(vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]]).unwrap();
        let check = SampleSizeValidator::new(requirement()).check(&ds, 0.05).unwrap();
        assert!(check.violated);
        assert_eq!(check.severity, Severity::Critical);
    }

    #[test]
    fn test_below_recommended_is_advisory() {
        let ds = Dataset::single(vec![1.0; 8]).unwrap();
        let check = SampleSizeValidator::new(requirement()).check(&ds, 0.05).unwrap();
        assert!(!check.violated);
        assert_eq!(check.severity, Severity::None);
        assert!(check.advisory.unwrap().contains("Low statistical power"));
    }

    #[test]
    fn test_adequate_sample() {
        let ds = Dataset::single(vec![1.0; 25]).unwrap();
        let check = SampleSizeValidator::new(requirement()).check(&ds, 0.05).unwrap();
        assert!(!check.violated);
        assert!(check.advisory.is_none());
    }
}
