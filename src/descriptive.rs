//! Descriptive statistics in f64 for the validators
//!
//! The validators need double precision (p-values near alpha, transform
//! round trips at 1e-9) while `trueno`/`aprender` work in f32, so moments,
//! medians and ranks come from `statrs`. Quartiles use the R-7 definition,
//! the same one `aprender::stats::DescriptiveStats` uses for the group
//! summaries; `statrs` quantiles are R-8, so R-7 is computed here.

use statrs::statistics::{Data, OrderStatistics, RankTieBreaker, Statistics};
use std::cmp::Ordering;

/// Sort a copy of the values in ascending order
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Statistics::mean(values))
}

/// Sample variance (n - 1 denominator)
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(Statistics::variance(values))
}

/// Sum of squared deviations from the mean
pub fn sum_of_squares(values: &[f64]) -> f64 {
    match mean(values) {
        Some(m) => values.iter().map(|v| (v - m).powi(2)).sum(),
        None => 0.0,
    }
}

/// R-7 quantile of already-sorted data (linear interpolation, h = (n-1)p)
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values.to_vec());
    Some(OrderStatistics::median(&mut data))
}

/// Median absolute deviation from the median (unscaled)
pub fn median_absolute_deviation(values: &[f64]) -> Option<f64> {
    let med = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median(&deviations)
}

/// Adjusted Fisher-Pearson sample skewness (G1)
///
/// `None` for fewer than 3 values or zero variance.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let m = mean(values)?;
    let nf = n as f64;
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / nf;
    if m2 <= f64::EPSILON * m.abs().max(1.0) {
        return None;
    }
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / nf;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0))
}

/// Sample excess kurtosis (G2, bias-adjusted)
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let m = mean(values)?;
    let nf = n as f64;
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / nf;
    if m2 <= f64::EPSILON * m.abs().max(1.0) {
        return None;
    }
    let m4 = values.iter().map(|v| (v - m).powi(4)).sum::<f64>() / nf;
    let g2 = m4 / (m2 * m2) - 3.0;
    Some(((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0)))
}

/// Ranks starting at 1, ties receive the average of their positions
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut data = Data::new(values.to_vec());
    data.ranks(RankTieBreaker::Average)
}

/// Result of an ordinary least squares fit
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    /// Coefficients, intercept first
    pub coefficients: Vec<f64>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    pub r_squared: f64,
}

/// Polynomial least squares of `y` on `x` up to `degree`
///
/// `x` is centered before building the design matrix to keep the normal
/// equations well conditioned; the returned coefficients refer to the
/// centered predictor. `None` when the system is singular.
pub fn polynomial_fit(x: &[f64], y: &[f64], degree: usize) -> Option<LeastSquaresFit> {
    let n = x.len();
    let k = degree + 1;
    if n != y.len() || n < k {
        return None;
    }
    let x_mean = mean(x)?;
    let scale = x.iter().map(|v| (v - x_mean).abs()).fold(0.0, f64::max);
    if scale <= 0.0 {
        return None;
    }

    let row = |xi: f64| -> Vec<f64> {
        let u = (xi - x_mean) / scale;
        (0..k).map(|p| u.powi(p as i32)).collect()
    };

    // Normal equations: (XᵀX) β = Xᵀy
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (&xi, &yi) in x.iter().zip(y) {
        let r = row(xi);
        for a in 0..k {
            xty[a] += r[a] * yi;
            for b in 0..k {
                xtx[a][b] += r[a] * r[b];
            }
        }
    }
    let coefficients = solve_linear_system(xtx, xty)?;

    let fitted: Vec<f64> = x
        .iter()
        .map(|&xi| row(xi).iter().zip(&coefficients).map(|(a, b)| a * b).sum())
        .collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();

    let ss_tot = sum_of_squares(y);
    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(LeastSquaresFit {
        coefficients,
        fitted,
        residuals,
        r_squared,
    })
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for c in col..n {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_r7() {
        let data = sorted(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 100.0]);
        assert_eq!(quantile_sorted(&data, 0.25), Some(1.0));
        assert_eq!(quantile_sorted(&data, 0.75), Some(2.25));
        assert_eq!(quantile_sorted(&data, 0.5), Some(2.0));
    }

    #[test]
    fn test_sample_variance() {
        let v = sample_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((v - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(sample_variance(&[1.0]), None);
    }

    #[test]
    fn test_mad() {
        let mad = median_absolute_deviation(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]).unwrap();
        assert_eq!(mad, 1.0);
    }

    #[test]
    fn test_skewness_sign() {
        let right = [1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 10.0];
        assert!(skewness(&right).unwrap() > 1.0);
        let left: Vec<f64> = right.iter().map(|v| -v).collect();
        assert!(skewness(&left).unwrap() < -1.0);
        assert_eq!(skewness(&[4.0, 4.0, 4.0]), None);
    }

    #[test]
    fn test_average_ranks_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
        assert!(average_ranks(&[]).is_empty());
    }

    #[test]
    fn test_median_and_mean() {
        assert_eq!(median(&[3.0, 1.0, 2.0, 10.0]), Some(2.5));
        assert_eq!(median(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_polynomial_fit_exact_quadratic() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v + v * v).collect();

        let quad = polynomial_fit(&x, &y, 2).unwrap();
        assert!((quad.r_squared - 1.0).abs() < 1e-9);
        assert!(quad.residuals.iter().all(|r| r.abs() < 1e-8));

        let lin = polynomial_fit(&x, &y, 1).unwrap();
        assert!(lin.r_squared < 1.0);
        assert!(lin.r_squared > 0.9);
    }

    #[test]
    fn test_polynomial_fit_constant_x_is_singular() {
        assert!(polynomial_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0], 1).is_none());
    }
}
