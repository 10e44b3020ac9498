// Independence of consecutive observations
//
// Lag-1 autocorrelation r1 with a large-sample z = r1·√n test, reported
// together with the Durbin-Watson statistic d ≈ 2(1 - r1). Meaningful for
// ordered data and regression residuals.

use super::{Assumption, AssumptionCheck, Severity, Validator};
use crate::dataset::Dataset;
use crate::descriptive::mean;
use crate::error::{GuardianError, Result};
use crate::special::two_sided_normal_p;

/// Durbin-Watson bounds outside which autocorrelation is critical
const DW_CRITICAL_LOW: f64 = 1.0;
const DW_CRITICAL_HIGH: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Autocorrelation {
    r1: f64,
    durbin_watson: f64,
    p_value: f64,
}

fn autocorrelation(values: &[f64]) -> Option<Autocorrelation> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let m = mean(values)?;
    let centered: Vec<f64> = values.iter().map(|v| v - m).collect();
    let ss: f64 = centered.iter().map(|e| e * e).sum();
    if ss <= f64::EPSILON * m.abs().max(1.0) {
        return None;
    }

    let lagged: f64 = centered.windows(2).map(|w| w[0] * w[1]).sum();
    let diffs: f64 = centered.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    let r1 = lagged / ss;

    Some(Autocorrelation {
        r1,
        durbin_watson: diffs / ss,
        p_value: two_sided_normal_p(r1 * (n as f64).sqrt()),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndependenceValidator;

impl Validator for IndependenceValidator {
    fn assumption(&self) -> Assumption {
        Assumption::Independence
    }

    fn check(&self, data: &Dataset, alpha: f64) -> Result<AssumptionCheck> {
        let multi = data.group_count() > 1;
        let mut worst: Option<(usize, Autocorrelation)> = None;

        for (i, group) in data.groups().iter().enumerate() {
            let ac = autocorrelation(group).ok_or_else(|| {
                GuardianError::unavailable(
                    Assumption::Independence.id(),
                    format!(
                        "group {} needs at least 3 values with non-zero variance (n={})",
                        i + 1,
                        group.len()
                    ),
                )
            })?;
            if worst.map_or(true, |(_, w)| ac.p_value < w.p_value) {
                worst = Some((i, ac));
            }
        }

        let Some((index, ac)) = worst else {
            return Err(GuardianError::data_format("dataset has no groups"));
        };
        let detail = format!(
            "lag-1 autocorrelation r1={:.4}, Durbin-Watson d={:.3}, p={:.4}",
            ac.r1, ac.durbin_watson, ac.p_value
        );

        let mut check = if ac.p_value < alpha {
            let severity = if ac.durbin_watson < DW_CRITICAL_LOW || ac.durbin_watson > DW_CRITICAL_HIGH
            {
                Severity::Critical
            } else {
                Severity::Warning
            };
            AssumptionCheck::violation(
                Assumption::Independence,
                severity,
                format!("{} < alpha={}", detail, alpha),
                "Observations are serially correlated; use methods that model the dependence \
                 (e.g. block bootstrap or generalized least squares)",
            )
        } else {
            AssumptionCheck::satisfied(Assumption::Independence, detail)
        };

        if multi {
            check.message = format!("group {}: {}", index + 1, check.message);
            check.group = Some(index + 1);
        }
        Ok(check
            .with_statistic(ac.durbin_watson)
            .with_p_value(ac.p_value))
    }
}
