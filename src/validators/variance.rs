// Homogeneity of variance via the median-centered Levene test
//
// Brown-Forsythe variant: one-way ANOVA on |x - median(group)|. Robust to
// non-normal groups, which is exactly when the assumption matters most.

use super::{Assumption, AssumptionCheck, Severity, Validator};
use crate::dataset::Dataset;
use crate::descriptive::{mean, median, sample_variance};
use crate::error::{GuardianError, Result};
use crate::special::f_upper_tail;

/// max(variance) / min(variance) above which a violation is critical
pub const VARIANCE_RATIO_CRITICAL: f64 = 4.0;

/// Levene (Brown-Forsythe) test result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeveneTest {
    pub statistic: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub p_value: f64,
}

/// Median-centered Levene test over two or more groups
///
/// Returns `None` with fewer than two groups, a group with fewer than two
/// values, or when every absolute deviation is zero.
pub fn levene_median(groups: &[Vec<f64>]) -> Option<LeveneTest> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.len() < 2) {
        return None;
    }

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let med = median(g).unwrap_or(0.0);
            g.iter().map(|x| (x - med).abs()).collect()
        })
        .collect();

    let n_total: usize = deviations.iter().map(Vec::len).sum();
    let grand_mean = deviations.iter().flatten().sum::<f64>() / n_total as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for z in &deviations {
        let group_mean = mean(z)?;
        ss_between += z.len() as f64 * (group_mean - grand_mean).powi(2);
        ss_within += z.iter().map(|v| (v - group_mean).powi(2)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;
    if df_within <= 0.0 {
        return None;
    }
    let ms_within = ss_within / df_within;
    let ms_between = ss_between / df_between;

    let statistic = if ms_within > 0.0 {
        ms_between / ms_within
    } else if ms_between > 0.0 {
        f64::INFINITY
    } else {
        return None;
    };

    Some(LeveneTest {
        statistic,
        df_between,
        df_within,
        p_value: f_upper_tail(statistic, df_between, df_within),
    })
}

/// Levene check with variance-ratio escalation
#[derive(Debug, Clone, Copy, Default)]
pub struct VarianceHomogeneityValidator;

impl Validator for VarianceHomogeneityValidator {
    fn assumption(&self) -> Assumption {
        Assumption::VarianceHomogeneity
    }

    fn check(&self, data: &Dataset, alpha: f64) -> Result<AssumptionCheck> {
        let groups = data.groups();
        if groups.len() < 2 {
            return Err(GuardianError::unavailable(
                Assumption::VarianceHomogeneity.id(),
                format!("requires at least 2 groups, got {}", groups.len()),
            ));
        }
        let levene = levene_median(groups).ok_or_else(|| {
            GuardianError::unavailable(
                Assumption::VarianceHomogeneity.id(),
                "degenerate groups (fewer than 2 values or zero spread in every group)",
            )
        })?;

        let variances: Vec<f64> = groups
            .iter()
            .filter_map(|g| sample_variance(g))
            .collect();
        let max_var = variances.iter().copied().fold(0.0, f64::max);
        let min_var = variances.iter().copied().fold(f64::INFINITY, f64::min);
        let ratio = if min_var > 0.0 {
            max_var / min_var
        } else {
            f64::INFINITY
        };

        if levene.p_value >= alpha {
            return Ok(AssumptionCheck::satisfied(
                Assumption::VarianceHomogeneity,
                format!(
                    "Levene F({}, {})={:.4}, p={:.4} >= alpha={}; variance ratio {:.2}",
                    levene.df_between, levene.df_within, levene.statistic, levene.p_value, alpha, ratio
                ),
            )
            .with_statistic(levene.statistic)
            .with_p_value(levene.p_value));
        }

        let severity = if ratio > VARIANCE_RATIO_CRITICAL {
            Severity::Critical
        } else {
            Severity::Warning
        };
        let recommendation = if groups.len() == 2 {
            "Use Welch's t-test, which does not assume equal variances"
        } else {
            "Use Welch's ANOVA or a rank-based test"
        };

        Ok(AssumptionCheck::violation(
            Assumption::VarianceHomogeneity,
            severity,
            format!(
                "Levene F({}, {})={:.4}, p={:.4} < alpha={}; variance ratio {:.2} (critical above {})",
                levene.df_between,
                levene.df_within,
                levene.statistic,
                levene.p_value,
                alpha,
                ratio,
                VARIANCE_RATIO_CRITICAL
            ),
            recommendation,
        )
        .with_statistic(levene.statistic)
        .with_p_value(levene.p_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levene_detects_spread_difference() {
        let tight = vec![4.9, 5.0, 5.0, 5.1, 5.0];
        let wide = vec![0.0, 3.0, 5.0, 7.0, 10.0];
        let r = levene_median(&[tight, wide]).unwrap();
        assert!(r.p_value < 0.05, "p={}", r.p_value);
    }

    #[test]
    fn test_levene_similar_groups() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![2.0, 3.0, 4.0, 5.0, 6.0];
        let r = levene_median(&[a, b]).unwrap();
        assert!(r.p_value > 0.5);
    }

    #[test]
    fn test_single_group_is_unavailable() {
        let ds = Dataset::single(vec![1.0, 2.0, 3.0]).unwrap();
        let err = VarianceHomogeneityValidator.check(&ds, 0.05).unwrap_err();
        assert_eq!(err.code(), "validator_unavailable");
    }

    #[test]
    fn test_constant_groups_are_unavailable() {
        let ds = Dataset::from_groups(vec![vec![2.0; 5], vec![3.0; 5]]).unwrap();
        assert!(VarianceHomogeneityValidator.check(&ds, 0.05).is_err());
    }

    #[test]
    fn test_large_ratio_is_critical() {
        let tight = vec![4.9, 5.0, 5.0, 5.1, 5.0, 4.95, 5.05];
        let wide = vec![0.0, 3.0, 5.0, 7.0, 10.0, -2.0, 12.0];
        let ds = Dataset::from_groups(vec![tight, wide]).unwrap();
        let check = VarianceHomogeneityValidator.check(&ds, 0.05).unwrap();
        assert!(check.violated);
        assert_eq!(check.severity, Severity::Critical);
    }
}
