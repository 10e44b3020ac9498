use super::apply::apply;
use super::{Transform, TransformKind, TransformationSuggestion};
use crate::descriptive::{excess_kurtosis, skewness};
use crate::error::{GuardianError, Result};
use crate::validators::Assumption;
use tracing::debug;

/// |excess kurtosis| above this goes straight to ranks
const HEAVY_TAIL_KURTOSIS: f64 = 7.0;
const STRONG_SKEW: f64 = 1.0;
const MODERATE_SKEW: f64 = 0.5;

/// Recommend a transform for data that failed `violation`
///
/// Outlier and modality problems, or very heavy tails, get the rank
/// transform. Otherwise the sign and size of the skewness pick among log,
/// sqrt, reflect-and-inverse and maximum-likelihood Box-Cox. A candidate
/// that cannot be applied to the data falls back to ranks.
///
/// # Errors
/// `DataFormat` for fewer than 3 finite values or constant data;
/// `TransformationNotApplicable` for violations no transform repairs
/// (independence, sample size).
pub fn suggest(values: &[f64], violation: Assumption) -> Result<TransformationSuggestion> {
    if values.len() < 3 {
        return Err(GuardianError::data_format(format!(
            "need at least 3 values to suggest a transform, got {}",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(GuardianError::data_format("values must be finite"));
    }
    if matches!(violation, Assumption::Independence | Assumption::SampleSize) {
        return Err(GuardianError::not_applicable(
            "any",
            format!("{} cannot be repaired by transforming values", violation.display_name()),
        ));
    }
    let skew = skewness(values)
        .ok_or_else(|| GuardianError::data_format("constant data has no skewness to correct"))?;
    let kurtosis = excess_kurtosis(values).unwrap_or(0.0);

    let (candidate, rationale) = choose(values, violation, skew, kurtosis);
    let (transform, rationale) = match candidate {
        Ok(t) if apply(values, t).is_ok() => (t, rationale),
        _ => (
            Transform::Rank,
            format!("{}; not applicable to this data, using ranks instead", rationale),
        ),
    };

    let improvement = expected_improvement(values, transform, skew);
    debug!(
        transform = %transform,
        skew,
        kurtosis,
        improvement,
        "transform suggested"
    );
    Ok(TransformationSuggestion {
        transform,
        expected_improvement: improvement,
        rationale,
    })
}

fn choose(
    values: &[f64],
    violation: Assumption,
    skew: f64,
    kurtosis: f64,
) -> (Result<Transform>, String) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let fit = |kind| Transform::fit(kind, values, None, None);

    if matches!(violation, Assumption::Outliers | Assumption::Modality) {
        return (
            Ok(Transform::Rank),
            format!("{} violated: ranks are insensitive to extreme values and clusters", violation.id()),
        );
    }
    if kurtosis.abs() > HEAVY_TAIL_KURTOSIS {
        return (
            Ok(Transform::Rank),
            format!("excess kurtosis {:.2} is too heavy-tailed for a power transform", kurtosis),
        );
    }
    if skew > STRONG_SKEW {
        return if min > 0.0 {
            (
                fit(TransformKind::Log),
                format!("strong positive skew ({:.2}) on positive data: log", skew),
            )
        } else if min == 0.0 {
            (
                fit(TransformKind::Log),
                format!("strong positive skew ({:.2}) with zeros: log(x + 1)", skew),
            )
        } else {
            (
                fit(TransformKind::BoxCox),
                format!("strong positive skew ({:.2}) with negative values: shifted Box-Cox", skew),
            )
        };
    }
    if skew > MODERATE_SKEW {
        return (
            fit(TransformKind::Sqrt),
            format!("moderate positive skew ({:.2}): square root", skew),
        );
    }
    if skew < -STRONG_SKEW {
        return (
            fit(TransformKind::Inverse),
            format!("strong negative skew ({:.2}): reflect and invert", skew),
        );
    }
    (
        fit(TransformKind::BoxCox),
        format!("mild skew ({:.2}): Box-Cox with maximum-likelihood lambda", skew),
    )
}

/// Relative reduction in |skewness| after applying `transform`, in [0, 1]
fn expected_improvement(values: &[f64], transform: Transform, skew_before: f64) -> f64 {
    if skew_before == 0.0 {
        return 0.0;
    }
    let skew_after = apply(values, transform)
        .ok()
        .and_then(|t| skewness(&t.values))
        .unwrap_or(0.0);
    ((skew_before.abs() - skew_after.abs()) / skew_before.abs()).clamp(0.0, 1.0)
}
