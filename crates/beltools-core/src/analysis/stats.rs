//! Descriptive statistics and the distribution tails used by the analyses.

use statrs::distribution::{Binomial, ChiSquared, ContinuousCDF, DiscreteCDF, Hypergeometric};

use crate::error::{BelError, Result};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Central moment of order `k`.
fn moment(values: &[f64], m: f64, k: i32) -> f64 {
    values.iter().map(|v| (v - m).powi(k)).sum::<f64>() / values.len() as f64
}

fn skew_z(values: &[f64], m2: f64, mean: f64) -> f64 {
    let n = values.len() as f64;
    let b2 = moment(values, mean, 3) / m2.powf(1.5);

    let mut y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    if y == 0.0 {
        y = 1.0;
    }
    delta * (y / alpha + ((y / alpha).powi(2) + 1.0).sqrt()).ln()
}

fn kurtosis_z(values: &[f64], m2: f64, mean: f64) -> Option<f64> {
    let n = values.len() as f64;
    let b2 = moment(values, mean, 4) / (m2 * m2);

    let e = 3.0 * (n - 1.0) / (n + 1.0);
    let varb2 = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - e) / varb2.sqrt();
    let sqrtbeta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrtbeta1 * (2.0 / sqrtbeta1 + (1.0 + 4.0 / (sqrtbeta1 * sqrtbeta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return None;
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).powf(1.0 / 3.0);
    Some((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

/// D'Agostino–Pearson omnibus normality test p-value.
///
/// Needs at least 8 values with non-zero variance.
pub fn normality_test(values: &[f64]) -> Option<f64> {
    if values.len() < 8 {
        return None;
    }
    let m = mean(values)?;
    let m2 = moment(values, m, 2);
    if m2 <= 0.0 {
        return None;
    }

    let s = skew_z(values, m2, m);
    let k = kurtosis_z(values, m2, m)?;
    let k2 = s * s + k * k;
    if !k2.is_finite() {
        return None;
    }

    let chi2 = ChiSquared::new(2.0).ok()?;
    Some(chi2.sf(k2))
}

/// `P(X >= k)` for `X ~ Binomial(n, p)`.
pub fn binomial_upper_tail(k: u64, n: u64, p: f64) -> Result<f64> {
    if k == 0 {
        return Ok(1.0);
    }
    let dist = Binomial::new(p, n).map_err(|e| BelError::Statistics(e.to_string()))?;
    Ok(dist.sf(k - 1))
}

/// `P(X >= k)` for a hypergeometric draw of `draws` items from `population`
/// containing `successes` marked items.
pub fn hypergeometric_upper_tail(k: u64, population: u64, successes: u64, draws: u64) -> Result<f64> {
    if k == 0 {
        return Ok(1.0);
    }
    let dist = Hypergeometric::new(population, successes, draws)
        .map_err(|e| BelError::Statistics(e.to_string()))?;
    Ok(dist.sf(k - 1))
}
