// Outlier detection: union of Tukey fences and modified z-scores
//
// - IQR rule: outside [Q1 - 1.5·IQR, Q3 + 1.5·IQR] (R-7 quartiles)
// - Modified z-score: |0.6745·(x - median) / MAD| > 3.5 (Iglewicz & Hoaglin)
//
// When MAD is zero (more than half the values tie at the median) the
// mean absolute deviation scaled by 1.253314 stands in for it.

use super::{Assumption, AssumptionCheck, Severity, Validator};
use crate::dataset::Dataset;
use crate::descriptive::{median, median_absolute_deviation, quantile_sorted, sorted};
use crate::error::Result;

/// Fraction of flagged values above which outliers are critical
pub const CRITICAL_OUTLIER_FRACTION: f64 = 0.10;

const IQR_MULTIPLIER: f64 = 1.5;
const MODIFIED_Z_THRESHOLD: f64 = 3.5;
const MODIFIED_Z_SCALE: f64 = 0.6745;
const MEAN_AD_SCALE: f64 = 1.253_314;

/// Indices flagged by either rule
pub fn outlier_indices(values: &[f64]) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    let s = sorted(values);
    let (Some(q1), Some(q3), Some(med)) = (
        quantile_sorted(&s, 0.25),
        quantile_sorted(&s, 0.75),
        median(values),
    ) else {
        return Vec::new();
    };
    let iqr = q3 - q1;
    let lower = q1 - IQR_MULTIPLIER * iqr;
    let upper = q3 + IQR_MULTIPLIER * iqr;

    let mad = median_absolute_deviation(values).unwrap_or(0.0);
    let mean_ad = values.iter().map(|v| (v - med).abs()).sum::<f64>() / values.len() as f64;
    let modified_z = |v: f64| -> Option<f64> {
        if mad > 0.0 {
            Some(MODIFIED_Z_SCALE * (v - med) / mad)
        } else if mean_ad > 0.0 {
            Some((v - med) / (MEAN_AD_SCALE * mean_ad))
        } else {
            None
        }
    };

    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| {
            let by_iqr = iqr > 0.0 && (v < lower || v > upper);
            let by_z = modified_z(v).is_some_and(|z| z.abs() > MODIFIED_Z_THRESHOLD);
            by_iqr || by_z
        })
        .map(|(i, _)| i)
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutlierDetector;

impl Validator for OutlierDetector {
    fn assumption(&self) -> Assumption {
        Assumption::Outliers
    }

    fn check(&self, data: &Dataset, _alpha: f64) -> Result<AssumptionCheck> {
        let multi = data.group_count() > 1;

        // Worst group by flagged fraction
        let (index, flagged, n) = data
            .groups()
            .iter()
            .enumerate()
            .map(|(i, g)| (i, outlier_indices(g), g.len()))
            .fold(None, |best: Option<(usize, Vec<usize>, usize)>, cur| match best {
                Some(b) if b.1.len() as f64 / b.2 as f64 >= cur.1.len() as f64 / cur.2 as f64 => {
                    Some(b)
                }
                _ => Some(cur),
            })
            .unwrap_or((0, Vec::new(), 0));

        let prefix = if multi {
            format!("group {}: ", index + 1)
        } else {
            String::new()
        };

        let mut check = if flagged.is_empty() {
            AssumptionCheck::satisfied(
                Assumption::Outliers,
                format!("{}no outliers by IQR fences or modified z-score", prefix),
            )
            .with_statistic(0.0)
        } else {
            let fraction = flagged.len() as f64 / n as f64;
            let group = &data.groups()[index];
            let values: Vec<String> = flagged.iter().map(|&i| format!("{}", group[i])).collect();
            let severity = if fraction > CRITICAL_OUTLIER_FRACTION {
                Severity::Critical
            } else {
                Severity::Info
            };
            AssumptionCheck::violation(
                Assumption::Outliers,
                severity,
                format!(
                    "{}{} of {} values flagged ({:.1}%): {}",
                    prefix,
                    flagged.len(),
                    n,
                    fraction * 100.0,
                    values.join(", ")
                ),
                "Investigate flagged values; use a rank-based or trimmed-mean test if they are genuine",
            )
            .with_statistic(fraction)
        };
        if multi {
            check.group = Some(index + 1);
        }
        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_extreme_value() {
        let flagged = outlier_indices(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 100.0]);
        assert_eq!(flagged, vec![7]);
    }

    #[test]
    fn test_no_outliers_in_uniform_steps() {
        assert!(outlier_indices(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]).is_empty());
    }

    #[test]
    fn test_constant_has_no_outliers() {
        assert!(outlier_indices(&[5.0; 12]).is_empty());
    }

    #[test]
    fn test_mad_zero_falls_back_to_mean_deviation() {
        // More than half tie at the median, so MAD is zero
        let flagged = outlier_indices(&[5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 6.0, 40.0]);
        assert!(flagged.contains(&8));
    }

    #[test]
    fn test_fraction_above_ten_percent_is_critical() {
        let ds = Dataset::from_groups(vec![
            vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 100.0],
            vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0],
        ])
        .unwrap();
        let check = OutlierDetector.check(&ds, 0.05).unwrap();
        assert!(check.violated);
        assert_eq!(check.severity, Severity::Critical);
        assert_eq!(check.group, Some(1));
        assert!((check.test_statistic.unwrap() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_small_fraction_is_informational() {
        let mut values: Vec<f64> = (0..30).map(|i| (i % 7) as f64).collect();
        values.push(80.0);
        let ds = Dataset::single(values).unwrap();
        let check = OutlierDetector.check(&ds, 0.05).unwrap();
        assert!(check.violated);
        assert_eq!(check.severity, Severity::Info);
    }
}
