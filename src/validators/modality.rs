// Modality via kernel density peak counting
//
// Gaussian KDE with Silverman's rule-of-thumb bandwidth, evaluated on a
// fixed grid. A peak counts when it reaches 10% of the tallest peak and is
// separated from the previous counted peak by an antimode below 80% of the
// smaller of the two.

use super::{worst_group, Assumption, AssumptionCheck, Severity, Validator};
use crate::dataset::Dataset;
use crate::descriptive::{quantile_sorted, sample_variance, sorted};
use crate::error::Result;

const GRID_POINTS: usize = 512;
const MIN_PEAK_RATIO: f64 = 0.10;
const ANTIMODE_RATIO: f64 = 0.80;

/// Silverman bandwidth: 0.9 · min(sd, IQR/1.34) · n^(-1/5)
fn silverman_bandwidth(values: &[f64]) -> Option<f64> {
    let sd = sample_variance(values)?.sqrt();
    let s = sorted(values);
    let iqr = quantile_sorted(&s, 0.75)? - quantile_sorted(&s, 0.25)?;
    let spread = if iqr > 0.0 { sd.min(iqr / 1.34) } else { sd };
    let h = 0.9 * spread * (values.len() as f64).powf(-0.2);
    (h > 0.0).then_some(h)
}

/// Number of significant density peaks, `None` for degenerate input
pub fn count_modes(values: &[f64]) -> Option<usize> {
    if values.len() < 3 {
        return None;
    }
    let h = silverman_bandwidth(values)?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lo = min - 3.0 * h;
    let step = (max - min + 6.0 * h) / (GRID_POINTS - 1) as f64;

    let density: Vec<f64> = (0..GRID_POINTS)
        .map(|i| {
            let x = lo + i as f64 * step;
            values
                .iter()
                .map(|v| (-0.5 * ((x - v) / h).powi(2)).exp())
                .sum::<f64>()
        })
        .collect();

    let peaks: Vec<usize> = (1..GRID_POINTS - 1)
        .filter(|&i| density[i] > density[i - 1] && density[i] >= density[i + 1])
        .collect();
    let tallest = peaks.iter().map(|&i| density[i]).fold(0.0, f64::max);
    if tallest <= 0.0 {
        return Some(1);
    }

    let mut counted: Vec<usize> = Vec::new();
    for &p in peaks
        .iter()
        .filter(|&&i| density[i] >= MIN_PEAK_RATIO * tallest)
    {
        match counted.last().copied() {
            None => counted.push(p),
            Some(prev) => {
                let valley = density[prev..=p].iter().copied().fold(f64::INFINITY, f64::min);
                let smaller = density[prev].min(density[p]);
                if valley < ANTIMODE_RATIO * smaller {
                    counted.push(p);
                } else if density[p] > density[prev] {
                    // Shoulder of the same mode; keep the higher point
                    counted.pop();
                    counted.push(p);
                }
            }
        }
    }
    Some(counted.len().max(1))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModalityValidator;

impl ModalityValidator {
    fn check_group(&self, values: &[f64]) -> Result<AssumptionCheck> {
        let Some(modes) = count_modes(values) else {
            return Ok(AssumptionCheck::satisfied(
                Assumption::Modality,
                format!(
                    "insufficient data or variance for density estimation (n={}); modality not assessed",
                    values.len()
                ),
            ));
        };
        let check = if modes > 1 {
            AssumptionCheck::violation(
                Assumption::Modality,
                Severity::Warning,
                format!("kernel density shows {} separated peaks", modes),
                "Multimodal data suggests a mixture of populations; analyse subgroups separately \
                 or use a rank-based test",
            )
        } else {
            AssumptionCheck::satisfied(Assumption::Modality, "kernel density is unimodal")
        };
        Ok(check.with_statistic(modes as f64))
    }
}

impl Validator for ModalityValidator {
    fn assumption(&self) -> Assumption {
        Assumption::Modality
    }

    fn check(&self, data: &Dataset, _alpha: f64) -> Result<AssumptionCheck> {
        worst_group(data, |group| self.check_group(group))
    }
}
