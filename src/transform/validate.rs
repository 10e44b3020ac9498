use super::TransformValidation;
use crate::error::{GuardianError, Result};
use crate::validators::{shapiro_wilk, thin, MAX_SHAPIRO_N};

/// Compare Shapiro-Wilk p-values before and after a transform
///
/// # Errors
/// `DataFormat` when alpha is outside (0, 1) or either sample cannot be
/// tested (fewer than 3 values, constant, non-finite).
pub fn validate(original: &[f64], transformed: &[f64], alpha: f64) -> Result<TransformValidation> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(GuardianError::data_format(format!(
            "alpha must be in (0, 1), got {}",
            alpha
        )));
    }
    let before_p = p_value(original, "original")?;
    let after_p = p_value(transformed, "transformed")?;

    let improved = after_p >= alpha && after_p > before_p;
    let improvement_score = if before_p >= 1.0 {
        0.0
    } else {
        (100.0 * (after_p - before_p) / (1.0 - before_p)).clamp(0.0, 100.0)
    };

    Ok(TransformValidation {
        before_p,
        after_p,
        improved,
        improvement_score,
    })
}

fn p_value(values: &[f64], label: &str) -> Result<f64> {
    let sample = if values.len() > MAX_SHAPIRO_N {
        thin(values)
    } else {
        values.to_vec()
    };
    shapiro_wilk(&sample).map(|sw| sw.p_value).ok_or_else(|| {
        GuardianError::data_format(format!(
            "{} data cannot be tested for normality (n={}; need 3 or more finite, non-constant values)",
            label,
            values.len()
        ))
    })
}
