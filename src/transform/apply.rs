use super::boxcox::box_cox;
use super::{InverseMapping, Transform, TransformKind, TransformedData};
use crate::dataset::Dataset;
use crate::descriptive::average_ranks;
use crate::error::{GuardianError, Result};
use crate::special::inverse_normal_cdf;
use std::cmp::Ordering;
use tracing::warn;

/// Apply `transform` to `values`
///
/// # Errors
/// `DataFormat` for empty input; `TransformationNotApplicable` when a value
/// falls outside the transform's domain or the result is not finite.
pub fn apply(values: &[f64], transform: Transform) -> Result<TransformedData> {
    if values.is_empty() {
        return Err(GuardianError::data_format("cannot transform an empty sample"));
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let domain = |ok: bool, reason: String| {
        if ok {
            Ok(())
        } else {
            Err(GuardianError::not_applicable(transform.name(), reason))
        }
    };

    let (transformed, inverse): (Vec<f64>, InverseMapping) = match transform {
        Transform::Log { offset } => {
            domain(
                min + offset > 0.0,
                format!("requires x + {} > 0, minimum is {}", offset, min),
            )?;
            (
                values.iter().map(|&x| shifted_ln(x, offset)).collect(),
                InverseMapping::Exp { offset },
            )
        }
        Transform::Sqrt { offset } => {
            domain(
                min + offset >= 0.0,
                format!("requires x + {} >= 0, minimum is {}", offset, min),
            )?;
            (
                values.iter().map(|x| (x + offset).sqrt()).collect(),
                InverseMapping::Square { offset },
            )
        }
        Transform::BoxCox { lambda, offset } => {
            domain(lambda.is_finite(), format!("lambda must be finite, got {}", lambda))?;
            domain(
                min + offset > 0.0,
                format!("requires x + {} > 0, minimum is {}", offset, min),
            )?;
            (
                values.iter().map(|x| box_cox(x + offset, lambda)).collect(),
                InverseMapping::BoxCox { lambda, offset },
            )
        }
        Transform::Inverse { offset } => {
            domain(
                offset - max > 0.0,
                format!("requires {} - x > 0, maximum is {}", offset, max),
            )?;
            (
                values.iter().map(|x| 1.0 / (offset - x)).collect(),
                InverseMapping::Reciprocal { offset },
            )
        }
        Transform::Rank => normal_scores(values),
    };

    if let Some(bad) = transformed.iter().find(|t| !t.is_finite()) {
        return Err(GuardianError::not_applicable(
            transform.name(),
            format!("produced a non-finite value ({})", bad),
        ));
    }

    Ok(TransformedData {
        transform,
        values: transformed,
        inverse,
    })
}

/// ln(x + offset), through ln1p for the common offset of 1
fn shifted_ln(x: f64, offset: f64) -> f64 {
    if offset == 1.0 {
        x.ln_1p()
    } else {
        (x + offset).ln()
    }
}

/// Blom scores Φ⁻¹((r − 3/8)/(n + 1/4)) with average ranks for ties
fn normal_scores(values: &[f64]) -> (Vec<f64>, InverseMapping) {
    let n = values.len() as f64;
    let scores: Vec<f64> = average_ranks(values)
        .into_iter()
        .map(|r| inverse_normal_cdf((r - 0.375) / (n + 0.25)))
        .collect();

    let mut pairs: Vec<(f64, f64)> = scores.iter().copied().zip(values.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    pairs.dedup_by(|a, b| a.0 == b.0);
    let (node_scores, node_values): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

    (
        scores,
        InverseMapping::EmpiricalQuantile {
            scores: node_scores,
            values: node_values,
        },
    )
}

/// Apply `transform`, falling back to the rank transform when it is not
/// applicable; returns the transform actually used
pub fn apply_or_rank(values: &[f64], transform: Transform) -> Result<TransformedData> {
    match apply(values, transform) {
        Err(GuardianError::TransformationNotApplicable { transform: name, reason }) => {
            warn!(transform = %name, %reason, "falling back to rank transform");
            apply(values, Transform::Rank)
        }
        other => other,
    }
}

/// Apply one transform across all groups and keep the group structure
///
/// Ranks are computed on the pooled sample so groups stay comparable.
pub fn apply_to_groups(data: &Dataset, transform: Transform) -> Result<(Dataset, TransformedData)> {
    let pooled = apply(&data.pooled(), transform)?;
    let mut start = 0;
    let groups = data
        .groups()
        .iter()
        .map(|g| {
            let slice = pooled.values[start..start + g.len()].to_vec();
            start += g.len();
            slice
        })
        .collect();
    Ok((Dataset::from_groups(groups)?, pooled))
}

/// Smallest shift that puts every value in the transform's domain
pub(crate) fn domain_offset(values: &[f64], kind: TransformKind) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    match kind {
        TransformKind::Log if min > 0.0 => 0.0,
        TransformKind::Log if min == 0.0 => 1.0,
        TransformKind::Sqrt => (-min).max(0.0),
        TransformKind::Inverse => max + 1.0,
        TransformKind::Rank => 0.0,
        // Log with negatives and Box-Cox: shift the minimum to 1
        _ if min > 0.0 => 0.0,
        _ => 1.0 - min,
    }
}
