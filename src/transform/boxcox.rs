// Box-Cox power transform with maximum-likelihood λ
//
// Profile log-likelihood (Box & Cox 1964):
//   ℓ(λ) = −n/2 · ln σ̂²(λ) + (λ − 1) Σ ln xᵢ
// maximized on a 0.1-step grid over LAMBDA_RANGE, then refined by
// golden-section search around the best grid point.

/// Search range for λ
pub const LAMBDA_RANGE: (f64, f64) = (-5.0, 5.0);

/// |λ| below this is treated as the log limit
pub(crate) const LAMBDA_ZERO: f64 = 1e-9;

const GRID_STEP: f64 = 0.1;
const TOLERANCE: f64 = 1e-6;

/// Box-Cox of a single positive value, (x^λ − 1)/λ evaluated as
/// expm1(λ ln x)/λ
pub(crate) fn box_cox(x: f64, lambda: f64) -> f64 {
    if lambda.abs() < LAMBDA_ZERO {
        x.ln()
    } else {
        (lambda * x.ln()).exp_m1() / lambda
    }
}

/// Inverse of [`box_cox`], (λy + 1)^(1/λ) evaluated as exp(ln1p(λy)/λ)
pub(crate) fn inverse_box_cox(y: f64, lambda: f64) -> f64 {
    if lambda.abs() < LAMBDA_ZERO {
        y.exp()
    } else {
        ((lambda * y).ln_1p() / lambda).exp()
    }
}

fn has_spread(values: &[f64]) -> bool {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    max > min
}

/// Profile log-likelihood of λ for `values + offset`
///
/// `NEG_INFINITY` when a shifted value is non-positive or the transformed
/// data has no spread.
pub fn box_cox_log_likelihood(values: &[f64], lambda: f64, offset: f64) -> f64 {
    let n = values.len() as f64;
    if !has_spread(values) || values.iter().any(|v| v + offset <= 0.0) {
        return f64::NEG_INFINITY;
    }
    let transformed: Vec<f64> = values.iter().map(|v| box_cox(v + offset, lambda)).collect();
    if transformed.iter().any(|t| !t.is_finite()) {
        return f64::NEG_INFINITY;
    }
    let mean = transformed.iter().sum::<f64>() / n;
    let variance = transformed.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
    if variance <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let log_jacobian: f64 = values.iter().map(|v| (v + offset).ln()).sum();
    -0.5 * n * variance.ln() + (lambda - 1.0) * log_jacobian
}

/// Maximum-likelihood λ in `LAMBDA_RANGE`
///
/// `None` when fewer than two values, a shifted value is non-positive, the
/// values are all equal, or every λ is degenerate.
pub fn box_cox_mle(values: &[f64], offset: f64) -> Option<f64> {
    if values.len() < 2 || values.iter().any(|v| v + offset <= 0.0) || !has_spread(values) {
        return None;
    }
    let ll = |lambda: f64| box_cox_log_likelihood(values, lambda, offset);
    let (lo, hi) = LAMBDA_RANGE;

    let steps = ((hi - lo) / GRID_STEP).round() as usize;
    let (best, best_ll) = (0..=steps)
        .map(|i| lo + i as f64 * GRID_STEP)
        .map(|lambda| (lambda, ll(lambda)))
        .fold((lo, f64::NEG_INFINITY), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
    if !best_ll.is_finite() {
        return None;
    }

    // Golden-section refinement
    let ratio = (5f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = ((best - GRID_STEP).max(lo), (best + GRID_STEP).min(hi));
    let mut c = b - ratio * (b - a);
    let mut d = a + ratio * (b - a);
    while b - a > TOLERANCE {
        if ll(c) > ll(d) {
            b = d;
        } else {
            a = c;
        }
        c = b - ratio * (b - a);
        d = a + ratio * (b - a);
    }
    Some((a + b) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_cox_limits() {
        assert!((box_cox(std::f64::consts::E, 0.0) - 1.0).abs() < 1e-12);
        assert!((box_cox(4.0, 1.0) - 3.0).abs() < 1e-12);
        assert!((box_cox(4.0, 0.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_box_cox_near_zero_lambda() {
        // the power form loses most digits once λ is tiny but above LAMBDA_ZERO
        for &lambda in &[1e-8, -1e-8, 0.25, -1.5] {
            for &x in &[1e-6, 0.3, 7.0, 50.0] {
                let back = inverse_box_cox(box_cox(x, lambda), lambda);
                assert!((back - x).abs() <= 1e-12 * x, "lambda={} x={} back={}", lambda, x, back);
            }
        }
    }

    #[test]
    fn test_mle_recovers_log_for_lognormal_shape() {
        // exp of evenly spaced normal quantiles is exactly log-normal shaped
        let values: Vec<f64> = (0..99)
            .map(|i| crate::special::inverse_normal_cdf((i as f64 + 0.5) / 99.0).exp())
            .collect();
        let lambda = box_cox_mle(&values, 0.0).unwrap();
        assert!(lambda.abs() < 0.1, "lambda={}", lambda);
    }

    #[test]
    fn test_mle_near_one_for_symmetric_data() {
        let values = [2.0, 3.0, 4.0, 4.0, 5.0, 5.0, 5.0, 6.0, 6.0, 7.0, 8.0];
        let lambda = box_cox_mle(&values, 0.0).unwrap();
        assert!((lambda - 0.9).abs() < 0.2, "lambda={}", lambda);
    }

    #[test]
    fn test_mle_rejects_non_positive() {
        assert_eq!(box_cox_mle(&[-1.0, 2.0, 3.0], 0.0), None);
        assert!(box_cox_mle(&[-1.0, 2.0, 3.0], 2.0).is_some());
        assert_eq!(box_cox_log_likelihood(&[0.0, 1.0], 1.0, 0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_mle_rejects_constant_data() {
        // rounding in x^λ must not turn a constant sample into a finite likelihood
        assert_eq!(box_cox_mle(&[2.0, 2.0, 2.0], 0.0), None);
        assert_eq!(box_cox_mle(&[0.3; 10], 1.0), None);
        assert_eq!(box_cox_log_likelihood(&[2.0, 2.0, 2.0], 4.1, 0.0), f64::NEG_INFINITY);
    }
}
