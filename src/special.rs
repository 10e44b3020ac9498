//! Distribution functions behind the validators' p-values
//!
//! Thin f64 wrappers over `statrs`: the standard normal CDF and quantile
//! go through `statrs::function::erf`, the F tail through
//! `statrs::distribution::FisherSnedecor`.

use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use statrs::function::erf;

/// P(Z <= z) for a standard normal Z
pub fn normal_cdf(z: f64) -> f64 {
    (0.5 * erf::erfc(-z / std::f64::consts::SQRT_2)).clamp(0.0, 1.0)
}

/// Two-sided p-value for a standard normal statistic
pub fn two_sided_normal_p(z: f64) -> f64 {
    erf::erfc(z.abs() / std::f64::consts::SQRT_2).clamp(0.0, 1.0)
}

/// Quantile function of the standard normal distribution
///
/// Returns `-inf`/`+inf` at the boundaries and NaN outside [0, 1].
pub fn inverse_normal_cdf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -std::f64::consts::SQRT_2 * erf::erfc_inv(2.0 * p)
}

/// Upper tail P(F > f) of the F distribution with (d1, d2) degrees of freedom
///
/// Degenerate degrees of freedom give 1.0 (no evidence against the null).
pub fn f_upper_tail(f: f64, d1: f64, d2: f64) -> f64 {
    if f.is_nan() || f <= 0.0 {
        return 1.0;
    }
    if f.is_infinite() {
        return 0.0;
    }
    match FisherSnedecor::new(d1, d2) {
        Ok(dist) => dist.sf(f).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
