// Linearity of the x-y relationship
//
// Two pieces of evidence, both required for a violation:
// - effect size: partial R² gained by adding a quadratic term
// - pattern: Wald-Wolfowitz runs test on the signs of linear-fit residuals
//
// Input is `[x, y]`, or a single `y` observed at x = 1..n.

use super::{Assumption, AssumptionCheck, Severity, Validator};
use crate::dataset::Dataset;
use crate::descriptive::{polynomial_fit, sample_variance};
use crate::error::{GuardianError, Result};
use crate::special::two_sided_normal_p;

/// Below this many pairs the runs test has little power
pub const MIN_RUNS_TEST_N: usize = 20;

const IMPROVEMENT_THRESHOLD: f64 = 0.05;
const IMPROVEMENT_CRITICAL: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq)]
struct RunsTest {
    runs: usize,
    z: f64,
    p_value: f64,
}

/// Runs test on residual signs, normal approximation without continuity
/// correction. Residuals within rounding of zero carry no sign.
fn runs_test(residuals: &[f64]) -> RunsTest {
    let scale = residuals.iter().map(|r| r.abs()).fold(0.0, f64::max);
    let signs: Vec<bool> = residuals
        .iter()
        .filter(|r| r.abs() > 1e-12 * scale.max(1.0))
        .map(|&r| r > 0.0)
        .collect();

    let n1 = signs.iter().filter(|&&s| s).count() as f64;
    let n2 = signs.len() as f64 - n1;
    let runs = if signs.is_empty() {
        0
    } else {
        1 + signs.windows(2).filter(|w| w[0] != w[1]).count()
    };
    if n1 == 0.0 || n2 == 0.0 {
        return RunsTest {
            runs,
            z: 0.0,
            p_value: 1.0,
        };
    }

    let n = n1 + n2;
    let expected = 2.0 * n1 * n2 / n + 1.0;
    let variance = 2.0 * n1 * n2 * (2.0 * n1 * n2 - n) / (n * n * (n - 1.0));
    let z = if variance > 0.0 {
        (runs as f64 - expected) / variance.sqrt()
    } else {
        0.0
    };
    RunsTest {
        runs,
        z,
        p_value: two_sided_normal_p(z),
    }
}

fn xy(data: &Dataset) -> Result<(Vec<f64>, Vec<f64>)> {
    let unavailable = |reason: String| GuardianError::unavailable(Assumption::Linearity.id(), reason);
    match data.groups() {
        [y] => Ok(((1..=y.len()).map(|i| i as f64).collect(), y.clone())),
        [x, y] if x.len() == y.len() => Ok((x.clone(), y.clone())),
        [x, y] => Err(unavailable(format!(
            "x and y lengths differ ({} vs {})",
            x.len(),
            y.len()
        ))),
        groups => Err(unavailable(format!(
            "expects [x, y] or a single series, got {} groups",
            groups.len()
        ))),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearityValidator;

impl Validator for LinearityValidator {
    fn assumption(&self) -> Assumption {
        Assumption::Linearity
    }

    fn check(&self, data: &Dataset, alpha: f64) -> Result<AssumptionCheck> {
        let (x, y) = xy(data)?;
        let n = x.len();
        let unavailable = |reason: &str| GuardianError::unavailable(Assumption::Linearity.id(), reason);

        if n < 4 {
            return Err(unavailable("needs at least 4 (x, y) pairs"));
        }
        let zero_variance = |v: &[f64]| sample_variance(v).map_or(true, |s| s <= 0.0);
        if zero_variance(&x) || zero_variance(&y) {
            return Err(unavailable("x or y has zero variance"));
        }
        let (Some(linear), Some(quadratic)) = (polynomial_fit(&x, &y, 1), polynomial_fit(&x, &y, 2))
        else {
            return Err(unavailable("least squares system is singular"));
        };

        let headroom = 1.0 - linear.r_squared;
        let improvement = if headroom > f64::EPSILON {
            ((quadratic.r_squared - linear.r_squared) / headroom).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let runs = runs_test(&linear.residuals);

        let detail = format!(
            "quadratic term partial R²={:.4}, residual runs={} (z={:.3}, p={:.4})",
            improvement, runs.runs, runs.z, runs.p_value
        );

        let check = if improvement > IMPROVEMENT_THRESHOLD && runs.p_value < alpha {
            let severity = if improvement > IMPROVEMENT_CRITICAL {
                Severity::Critical
            } else {
                Severity::Warning
            };
            AssumptionCheck::violation(
                Assumption::Linearity,
                severity,
                format!("{}; relationship is curved", detail),
                "Transform x or y, add a polynomial term, or use Spearman's rank correlation",
            )
        } else {
            AssumptionCheck::satisfied(Assumption::Linearity, detail)
        };

        let check = check
            .with_statistic(improvement)
            .with_p_value(runs.p_value);
        if n < MIN_RUNS_TEST_N {
            Ok(check.with_advisory(format!(
                "Low statistical power: linearity assessed on {} pairs (fewer than {})",
                n, MIN_RUNS_TEST_N
            )))
        } else {
            Ok(check)
        }
    }
}
