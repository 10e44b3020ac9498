// Per-group descriptive summaries attached to every report
//
// - Uses trueno::Vector for SIMD-optimized mean, stddev, min and max
// - Uses aprender::stats::DescriptiveStats for quartiles (R-7)
//
// Summaries are computed in f32 for display; validators keep their own f64
// numerics.

use crate::dataset::Dataset;
use crate::descriptive::skewness;
use aprender::stats::DescriptiveStats;
use serde::{Deserialize, Serialize};
use trueno::Vector;

/// Descriptive statistics for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// 1-based group index
    pub group: usize,
    pub n: usize,
    pub mean: f64,
    /// Population standard deviation (divides by n)
    pub stddev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Adjusted Fisher-Pearson skewness, absent for n < 3 or constant data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skewness: Option<f64>,
}

impl GroupSummary {
    pub fn compute(group: usize, values: &[f64]) -> Self {
        let narrowed: Vec<f32> = values.iter().map(|&v| v as f32).collect();
        let v = Vector::from_slice(&narrowed);
        let stats = DescriptiveStats::new(&v);

        Self {
            group,
            n: values.len(),
            mean: f64::from(v.mean().unwrap_or(0.0)),
            stddev: f64::from(v.stddev().unwrap_or(0.0)),
            min: f64::from(v.min().unwrap_or(0.0)),
            q1: f64::from(stats.quantile(0.25).unwrap_or(0.0)),
            median: f64::from(stats.quantile(0.5).unwrap_or(0.0)),
            q3: f64::from(stats.quantile(0.75).unwrap_or(0.0)),
            max: f64::from(v.max().unwrap_or(0.0)),
            skewness: skewness(values),
        }
    }
}

/// Summaries for every group, in order
pub fn summarize(data: &Dataset) -> Vec<GroupSummary> {
    data.groups()
        .iter()
        .enumerate()
        .map(|(i, g)| GroupSummary::compute(i + 1, g))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_outlier_group() {
        let s = GroupSummary::compute(1, &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 100.0]);
        assert_eq!(s.n, 8);
        assert!((s.mean - 14.0).abs() < 1e-4);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 100.0);
        assert!((s.median - 2.0).abs() < 1e-6);
        assert!((s.q1 - 1.0).abs() < 1e-6);
        assert!((s.q3 - 2.25).abs() < 1e-6);
        assert!(s.skewness.unwrap() > 2.0);
    }

    #[test]
    fn test_summarize_numbers_groups() {
        let ds = Dataset::from_groups(vec![vec![1.0, 2.0], vec![3.0, 4.0, 5.0]]).unwrap();
        let summaries = summarize(&ds);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].group, 2);
        assert_eq!(summaries[1].n, 3);
        assert!(summaries[0].skewness.is_none());
    }

    #[test]
    fn test_constant_group_has_zero_spread() {
        let s = GroupSummary::compute(1, &[4.0; 6]);
        assert_eq!(s.stddev, 0.0);
        assert!(s.skewness.is_none());
    }
}
