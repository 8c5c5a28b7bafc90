//! Power-law exponent estimators for degree sequences.
//!
//! Both estimators look only at degrees >= 1 and return None when the data
//! cannot determine an exponent.
//!
//! # References
//!
//! - Clauset, Shalizi & Newman, "Power-law distributions in empirical data"
//!   (2009), eq. 3.7 for the discrete approximation used here

use serde::{Deserialize, Serialize};

/// How to fit `P(k) ~ k^-gamma`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerLawMethod {
    /// Discrete maximum-likelihood approximation with `k_min` = smallest degree.
    #[default]
    MaximumLikelihood,
    /// Least-squares line through the log-log degree histogram.
    LogLogRegression,
}

/// Estimate the exponent of the degree distribution.
pub fn fit(degrees: &[usize], method: PowerLawMethod) -> Option<f64> {
    match method {
        PowerLawMethod::MaximumLikelihood => maximum_likelihood(degrees),
        PowerLawMethod::LogLogRegression => log_log_regression(degrees),
    }
}

/// `gamma = 1 + n / sum(ln(k / (k_min - 0.5)))`
fn maximum_likelihood(degrees: &[usize]) -> Option<f64> {
    let positive: Vec<f64> = degrees.iter().filter(|&&d| d >= 1).map(|&d| d as f64).collect();
    let k_min = positive.iter().copied().fold(f64::INFINITY, f64::min);
    if positive.len() < 2 || !k_min.is_finite() {
        return None;
    }

    let denominator: f64 = positive.iter().map(|k| (k / (k_min - 0.5)).ln()).sum();
    (denominator > 0.0).then(|| 1.0 + positive.len() as f64 / denominator)
}

/// Negated slope of `ln(count)` against `ln(k)` over the observed degrees.
fn log_log_regression(degrees: &[usize]) -> Option<f64> {
    let max = degrees.iter().copied().max()?;
    let mut histogram = vec![0usize; max + 1];
    for &d in degrees {
        histogram[d] += 1;
    }

    let points: Vec<(f64, f64)> = histogram
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, count)| **count > 0)
        .map(|(k, &count)| ((k as f64).ln(), (count as f64).ln()))
        .collect();
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in &points {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x) * (x - mean_x);
    }
    (sxx > 0.0).then(|| -sxy / sxx)
}
