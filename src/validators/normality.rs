// Normality via the Shapiro-Wilk W test
//
// Coefficients and p-values follow Royston's approximation (AS R94):
// Blom scores for the expected normal order statistics, polynomial
// corrections for the two extreme coefficients, and a log-normal
// transformation of 1 - W for the p-value (n <= 11 uses the gamma-adjusted
// small-sample form).

use super::{worst_group, Assumption, AssumptionCheck, Severity, Validator};
use crate::dataset::Dataset;
use crate::descriptive::sorted;
use crate::error::{GuardianError, Result};
use crate::special::{inverse_normal_cdf, normal_cdf};

/// Largest sample the Royston approximation is valid for
pub const MAX_SHAPIRO_N: usize = 5000;

/// W statistic and its p-value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
}

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// c[0] + c[1]·x + c[2]·x² + ...
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Shapiro-Wilk test for 3 <= n <= 5000
///
/// Returns `None` outside that range, for non-finite input, or when every
/// value is identical.
pub fn shapiro_wilk(data: &[f64]) -> Option<ShapiroWilk> {
    let n = data.len();
    if !(3..=MAX_SHAPIRO_N).contains(&n) || data.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let x = sorted(data);
    let range = x[n - 1] - x[0];
    if range <= f64::EPSILON * x[n - 1].abs().max(1.0) {
        return None;
    }

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();

    if n == 3 {
        let a = std::f64::consts::FRAC_1_SQRT_2;
        let w = ((a * (x[2] - x[0])).powi(2) / ss).clamp(0.75, 1.0);
        let p = 1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos();
        return Some(ShapiroWilk {
            w,
            p_value: p.clamp(0.0, 1.0),
        });
    }

    let half = n / 2;
    let coefficients = coefficients(n, half)?;

    let numerator: f64 = (0..half)
        .map(|i| coefficients[i] * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (numerator * numerator / ss).min(1.0);

    Some(ShapiroWilk {
        w,
        p_value: p_value(w, n).clamp(0.0, 1.0),
    })
}

fn coefficients(n: usize, half: usize) -> Option<Vec<f64>> {
    let nf = n as f64;
    // Negative Blom scores for the lower half, m[0] is the most extreme
    let m: Vec<f64> = (0..half)
        .map(|i| inverse_normal_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    // Coefficients are reported for the upper order statistic (positive)
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];

    let (fac, first) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        let num = summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1];
        let den = 1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2;
        if num <= 0.0 || den <= 0.0 {
            return None;
        }
        a[0] = a1;
        a[1] = a2;
        ((num / den).sqrt(), 2)
    } else {
        let num = summ2 - 2.0 * m[0] * m[0];
        let den = 1.0 - 2.0 * a1 * a1;
        if num <= 0.0 || den <= 0.0 {
            return None;
        }
        a[0] = a1;
        ((num / den).sqrt(), 1)
    };

    for i in first..half {
        a[i] = -m[i] / fac;
    }
    Some(a)
}

fn p_value(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();

    let z = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return 0.0;
        }
        let y = -(gamma - y).ln();
        let m = poly(&C3, nf);
        let s = poly(&C4, nf).exp();
        (y - m) / s
    } else {
        let ln_n = nf.ln();
        let m = poly(&C5, ln_n);
        let s = poly(&C6, ln_n).exp();
        (y - m) / s
    };
    1.0 - normal_cdf(z)
}

/// Keep every k-th observation so at most `MAX_SHAPIRO_N` remain
pub(crate) fn thin(values: &[f64]) -> Vec<f64> {
    let stride = values.len().div_ceil(MAX_SHAPIRO_N);
    values.iter().step_by(stride).copied().collect()
}

/// Shapiro-Wilk normality check, per group
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalityValidator;

impl NormalityValidator {
    fn check_group(&self, values: &[f64], alpha: f64) -> Result<AssumptionCheck> {
        let n = values.len();
        if n < 3 {
            return Ok(AssumptionCheck::satisfied(
                Assumption::Normality,
                format!(
                    "insufficient data for Shapiro-Wilk (n={}, need at least 3); normality not assessed",
                    n
                ),
            ));
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max - min <= f64::EPSILON * max.abs().max(1.0) {
            return Ok(AssumptionCheck::satisfied(
                Assumption::Normality,
                format!(
                    "insufficient variance: all {} values are identical; normality not assessed",
                    n
                ),
            ));
        }

        let (sample, thinned) = if n > MAX_SHAPIRO_N {
            (thin(values), true)
        } else {
            (values.to_vec(), false)
        };
        let sw = shapiro_wilk(&sample).ok_or_else(|| {
            GuardianError::unavailable(
                Assumption::Normality.id(),
                "Shapiro-Wilk coefficients could not be computed",
            )
        })?;

        let basis = if thinned {
            format!(" (on {} of {} evenly strided values)", sample.len(), n)
        } else {
            String::new()
        };

        let check = if sw.p_value < alpha {
            AssumptionCheck::violation(
                Assumption::Normality,
                Severity::Warning,
                format!(
                    "Shapiro-Wilk W={:.4}, p={:.4} < alpha={}{}",
                    sw.w, sw.p_value, alpha, basis
                ),
                "Consider a non-parametric alternative or a normalizing transformation",
            )
        } else {
            AssumptionCheck::satisfied(
                Assumption::Normality,
                format!(
                    "Shapiro-Wilk W={:.4}, p={:.4} >= alpha={}{}",
                    sw.w, sw.p_value, alpha, basis
                ),
            )
        };
        Ok(check.with_statistic(sw.w).with_p_value(sw.p_value))
    }
}

impl Validator for NormalityValidator {
    fn assumption(&self) -> Assumption {
        Assumption::Normality
    }

    fn check(&self, data: &Dataset, alpha: f64) -> Result<AssumptionCheck> {
        worst_group(data, |group| self.check_group(group, alpha))
    }
}
