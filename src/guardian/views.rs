// Per-validator views of the request data
//
// The registry's input shape decides what each validator sees:
// - groups: the raw groups
// - paired_differences: one group of element-wise x - y
// - regression: linearity and sample size see [x, y]; normality,
//   independence and outliers see the linear-fit residuals; variance
//   homogeneity sees residuals split at the median fitted value
//
// A view that cannot be derived is recorded as a reason and surfaces as
// `validator_unavailable` for every validator that needed it.

use crate::dataset::Dataset;
use crate::descriptive::{median, polynomial_fit};
use crate::error::{GuardianError, Result};
use crate::registry::InputShape;
use crate::validators::Assumption;

type Derived = std::result::Result<Dataset, String>;

pub(crate) enum ViewSet<'a> {
    Raw(&'a Dataset),
    Paired(Derived),
    Regression {
        raw: &'a Dataset,
        residuals: Derived,
        split: Derived,
    },
}

impl<'a> ViewSet<'a> {
    pub(crate) fn derive(shape: InputShape, data: &'a Dataset) -> Self {
        match shape {
            InputShape::Groups => ViewSet::Raw(data),
            InputShape::PairedDifferences => ViewSet::Paired(paired_differences(data)),
            InputShape::Regression => {
                let (residuals, split) = match regression_residuals(data) {
                    Ok((fitted, residuals)) => (
                        Dataset::single(residuals.clone()).map_err(|e| e.to_string()),
                        split_at_median_fit(&fitted, &residuals),
                    ),
                    Err(reason) => (Err(reason.clone()), Err(reason)),
                };
                ViewSet::Regression {
                    raw: data,
                    residuals,
                    split,
                }
            }
        }
    }

    /// Data the validator for `assumption` should see
    pub(crate) fn view(&self, assumption: Assumption) -> Result<&Dataset> {
        let derived = match self {
            ViewSet::Raw(data) => return Ok(*data),
            ViewSet::Paired(diffs) => diffs,
            ViewSet::Regression {
                raw,
                residuals,
                split,
            } => match assumption {
                Assumption::Normality | Assumption::Independence | Assumption::Outliers => {
                    residuals
                }
                Assumption::VarianceHomogeneity => split,
                Assumption::Linearity | Assumption::SampleSize | Assumption::Modality => {
                    return Ok(*raw)
                }
            },
        };
        derived
            .as_ref()
            .map_err(|reason| GuardianError::unavailable(assumption.id(), reason.clone()))
    }
}

fn paired_differences(data: &Dataset) -> Derived {
    match data.groups() {
        [x, y] if x.len() == y.len() => {
            Dataset::single(x.iter().zip(y).map(|(a, b)| a - b).collect())
                .map_err(|e| e.to_string())
        }
        [x, y] => Err(format!(
            "paired data needs equal-length groups ({} vs {})",
            x.len(),
            y.len()
        )),
        groups => Err(format!(
            "paired data needs exactly 2 groups, got {}",
            groups.len()
        )),
    }
}

/// Fitted values and residuals of the linear fit of y on x
fn regression_residuals(data: &Dataset) -> std::result::Result<(Vec<f64>, Vec<f64>), String> {
    let (x, y): (Vec<f64>, &[f64]) = match data.groups() {
        [y] => ((1..=y.len()).map(|i| i as f64).collect(), y.as_slice()),
        [x, y] if x.len() == y.len() => (x.clone(), y.as_slice()),
        [x, y] => {
            return Err(format!(
                "regression needs equal-length x and y ({} vs {})",
                x.len(),
                y.len()
            ))
        }
        groups => {
            return Err(format!(
                "regression needs [x, y] or a single series, got {} groups",
                groups.len()
            ))
        }
    };
    let fit = polynomial_fit(&x, y, 1)
        .ok_or_else(|| "linear fit is singular (fewer than 2 points or constant x)".to_string())?;
    Ok((fit.fitted, fit.residuals))
}

fn split_at_median_fit(fitted: &[f64], residuals: &[f64]) -> Derived {
    let cut = median(fitted).ok_or_else(|| "no fitted values".to_string())?;
    let (low, high): (Vec<(f64, f64)>, Vec<(f64, f64)>) = fitted
        .iter()
        .copied()
        .zip(residuals.iter().copied())
        .partition(|(f, _)| *f <= cut);
    let low: Vec<f64> = low.into_iter().map(|(_, r)| r).collect();
    let high: Vec<f64> = high.into_iter().map(|(_, r)| r).collect();
    if low.len() < 2 || high.len() < 2 {
        return Err(format!(
            "residual halves too small for a variance comparison ({} and {})",
            low.len(),
            high.len()
        ));
    }
    Dataset::from_groups(vec![low, high]).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_view_is_identity() {
        let ds = Dataset::from_groups(vec![vec![1.0, 2.0], vec![3.0]]).unwrap();
        let views = ViewSet::derive(InputShape::Groups, &ds);
        assert_eq!(views.view(Assumption::Normality).unwrap(), &ds);
    }

    #[test]
    fn test_paired_differences() {
        let ds = Dataset::from_groups(vec![vec![5.0, 7.0, 9.0], vec![1.0, 2.0, 3.0]]).unwrap();
        let views = ViewSet::derive(InputShape::PairedDifferences, &ds);
        let view = views.view(Assumption::Normality).unwrap();
        assert_eq!(view.groups(), &[vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_paired_mismatch_is_unavailable() {
        let ds = Dataset::from_groups(vec![vec![5.0, 7.0, 9.0], vec![1.0, 2.0]]).unwrap();
        let views = ViewSet::derive(InputShape::PairedDifferences, &ds);
        let err = views.view(Assumption::Outliers).unwrap_err();
        assert_eq!(err.code(), "validator_unavailable");
        assert!(err.to_string().contains("equal-length"));
    }

    #[test]
    fn test_regression_views() {
        let x: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + if (*v as i32) % 3 == 0 { 1.0 } else { -0.5 }).collect();
        let ds = Dataset::from_groups(vec![x, y]).unwrap();
        let views = ViewSet::derive(InputShape::Regression, &ds);

        assert_eq!(views.view(Assumption::Linearity).unwrap(), &ds);
        let residuals = views.view(Assumption::Normality).unwrap();
        assert_eq!(residuals.group_count(), 1);
        assert_eq!(residuals.len(), 10);
        let sum: f64 = residuals.groups()[0].iter().sum();
        assert!(sum.abs() < 1e-9);

        let split = views.view(Assumption::VarianceHomogeneity).unwrap();
        assert_eq!(split.group_count(), 2);
        assert_eq!(split.groups()[0].len(), 5);
        assert_eq!(split.groups()[1].len(), 5);
    }

    #[test]
    fn test_regression_mismatch_only_blocks_residual_views() {
        let ds = Dataset::from_groups(vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0]]).unwrap();
        let views = ViewSet::derive(InputShape::Regression, &ds);
        assert!(views.view(Assumption::Normality).is_err());
        assert!(views.view(Assumption::VarianceHomogeneity).is_err());
        assert!(views.view(Assumption::SampleSize).is_ok());
    }
}
