// Transformation engine: repair violated assumptions by remapping the data
//
// Independent of the orchestrator; callers run it after a report flags
// normality, outlier or modality problems.
//
// - suggest: pick a transform from the skewness/kurtosis profile
// - apply: remap values and return the inverse mapping for back-transforming
//   estimates and intervals
// - validate: rerun the normality check before and after
// - emit_code: reproducible snippet for Python, R or Rust
//
// Every mapping is strictly increasing, so intervals back-transform by
// mapping their endpoints.
//
// Round trips hold to 1e-9 relative to x, with one limit: the reciprocal
// stores offset − x, so its error is relative to offset − x and grows for
// values much closer to zero than the offset.
//
// Scientific Foundation:
// [1] Box, G. E. P., & Cox, D. R. (1964). An analysis of transformations.
//     JRSS Series B, 26(2), 211-252.
// [2] Blom, G. (1958). Statistical Estimates and Transformed Beta-Variables.
//     Wiley. (normal scores for the rank transform)
// [3] Tabachnick, B. G., & Fidell, L. S. (2013). Using Multivariate
//     Statistics (6th ed.), section 4.1.6 (reflect-and-inverse for severe
//     negative skew).

mod apply;
mod boxcox;
mod codegen;
mod suggest;
mod validate;

pub use apply::{apply, apply_or_rank, apply_to_groups};
pub use boxcox::{box_cox_log_likelihood, box_cox_mle, LAMBDA_RANGE};
pub use codegen::{emit_code, CodeTarget};
pub use suggest::suggest;
pub use validate::validate;

use crate::error::{GuardianError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A transform and its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// ln(x + offset)
    Log { offset: f64 },
    /// √(x + offset)
    Sqrt { offset: f64 },
    /// ((x + offset)^λ − 1)/λ, or ln(x + offset) at λ = 0
    #[serde(rename = "boxcox")]
    BoxCox { lambda: f64, offset: f64 },
    /// Reflect and invert: 1/(offset − x)
    Inverse { offset: f64 },
    /// Blom normal scores of the ranks
    Rank,
}

/// Transform family without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Log,
    Sqrt,
    BoxCox,
    Inverse,
    Rank,
}

impl Transform {
    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::Log { .. } => TransformKind::Log,
            Transform::Sqrt { .. } => TransformKind::Sqrt,
            Transform::BoxCox { .. } => TransformKind::BoxCox,
            Transform::Inverse { .. } => TransformKind::Inverse,
            Transform::Rank => TransformKind::Rank,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind() {
            TransformKind::Log => "log",
            TransformKind::Sqrt => "sqrt",
            TransformKind::BoxCox => "boxcox",
            TransformKind::Inverse => "inverse",
            TransformKind::Rank => "rank",
        }
    }

    /// Parameterize `kind` for `values`
    ///
    /// A missing offset becomes the smallest shift into the transform's
    /// domain; a missing Box-Cox λ is estimated by maximum likelihood.
    pub fn fit(
        kind: TransformKind,
        values: &[f64],
        offset: Option<f64>,
        lambda: Option<f64>,
    ) -> Result<Self> {
        let offset = offset.unwrap_or_else(|| apply::domain_offset(values, kind));
        Ok(match kind {
            TransformKind::Log => Transform::Log { offset },
            TransformKind::Sqrt => Transform::Sqrt { offset },
            TransformKind::Inverse => Transform::Inverse { offset },
            TransformKind::Rank => Transform::Rank,
            TransformKind::BoxCox => {
                let lambda = match lambda {
                    Some(l) => l,
                    None => box_cox_mle(values, offset).ok_or_else(|| {
                        GuardianError::not_applicable(
                            "boxcox",
                            "no finite maximum-likelihood lambda (constant data or values outside the domain)",
                        )
                    })?,
                };
                Transform::BoxCox { lambda, offset }
            }
        })
    }
}

impl FromStr for TransformKind {
    type Err = GuardianError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "log1p" => Ok(TransformKind::Log),
            "sqrt" => Ok(TransformKind::Sqrt),
            "boxcox" | "box_cox" => Ok(TransformKind::BoxCox),
            "inverse" | "reciprocal" => Ok(TransformKind::Inverse),
            "rank" => Ok(TransformKind::Rank),
            other => Err(GuardianError::not_applicable(other, "unknown transform")),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Log { offset } if *offset == 0.0 => write!(f, "ln(x)"),
            Transform::Log { offset } => write!(f, "ln(x + {})", offset),
            Transform::Sqrt { offset } if *offset == 0.0 => write!(f, "sqrt(x)"),
            Transform::Sqrt { offset } => write!(f, "sqrt(x + {})", offset),
            Transform::BoxCox { lambda, offset } => {
                write!(f, "boxcox(x + {}, lambda={:.4})", offset, lambda)
            }
            Transform::Inverse { offset } => write!(f, "1/({} - x)", offset),
            Transform::Rank => write!(f, "normal scores of ranks"),
        }
    }
}

/// Recommended transform with its expected effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationSuggestion {
    pub transform: Transform,
    /// Relative reduction in |skewness| on the supplied data, in [0, 1]
    pub expected_improvement: f64,
    pub rationale: String,
}

/// How to map transformed values back to the original scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InverseMapping {
    /// x = exp(y) − offset
    Exp { offset: f64 },
    /// x = y² − offset
    Square { offset: f64 },
    /// x = (λy + 1)^(1/λ) − offset, or exp(y) − offset at λ = 0
    BoxCox { lambda: f64, offset: f64 },
    /// x = offset − 1/y; accurate relative to offset − x
    Reciprocal { offset: f64 },
    /// Piecewise-linear interpolation from normal scores to sorted values
    EmpiricalQuantile { scores: Vec<f64>, values: Vec<f64> },
}

impl InverseMapping {
    /// Back-transform one value
    pub fn invert(&self, y: f64) -> f64 {
        match self {
            InverseMapping::Exp { offset } if *offset == 1.0 => y.exp_m1(),
            InverseMapping::Exp { offset } => y.exp() - offset,
            InverseMapping::Square { offset } => y * y - offset,
            InverseMapping::BoxCox { lambda, offset } => boxcox::inverse_box_cox(y, *lambda) - offset,
            InverseMapping::Reciprocal { offset } => offset - 1.0 / y,
            InverseMapping::EmpiricalQuantile { scores, values } => {
                interpolate(scores, values, y)
            }
        }
    }

    pub fn invert_all(&self, ys: &[f64]) -> Vec<f64> {
        ys.iter().map(|&y| self.invert(y)).collect()
    }

    /// Back-transform an interval, e.g. a confidence interval on the
    /// transformed scale
    pub fn invert_interval(&self, lower: f64, upper: f64) -> (f64, f64) {
        (self.invert(lower), self.invert(upper))
    }
}

/// Exact at the nodes, linear between them, clamped outside
///
/// NaN when the node tables are empty or differ in length.
fn interpolate(scores: &[f64], values: &[f64], y: f64) -> f64 {
    if scores.len() != values.len() || y.is_nan() {
        return f64::NAN;
    }
    let (Some(&first), Some(&last)) = (scores.first(), scores.last()) else {
        return f64::NAN;
    };
    if y <= first {
        return values[0];
    }
    if y >= last {
        return values[values.len() - 1];
    }
    let i = scores.partition_point(|&s| s < y);
    if scores[i] == y {
        return values[i];
    }
    let (s0, s1) = (scores[i - 1], scores[i]);
    let (v0, v1) = (values[i - 1], values[i]);
    v0 + (v1 - v0) * (y - s0) / (s1 - s0)
}

/// Transformed values with the mapping back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedData {
    pub transform: Transform,
    pub values: Vec<f64>,
    pub inverse: InverseMapping,
}

/// Normality before and after a transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformValidation {
    pub before_p: f64,
    pub after_p: f64,
    /// after_p ≥ alpha and after_p > before_p
    pub improved: bool,
    /// p-value gain normalized to [0, 100]
    pub improvement_score: f64,
}
