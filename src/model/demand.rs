// src/model/demand.rs

//! Truncated Poisson demand.
//!
//! Each period's demand is Poisson with a given mean, cut off at the
//! `quantile`-th quantile so it has a finite support `{0, .., M}`.
//! Probabilities are divided by the quantile rather than by the retained
//! mass, so a table sums to slightly less or more than one.

use crate::error::{PolicyError, PolicyResult};
use statrs::distribution::{Discrete, DiscreteCDF, Poisson};

fn check_quantile(quantile: f64) -> PolicyResult<()> {
    if quantile.is_finite() && quantile > 0.0 && quantile < 1.0 {
        Ok(())
    } else {
        Err(PolicyError::InvalidInput(format!(
            "truncation quantile must lie in (0, 1), got {}",
            quantile
        )))
    }
}

fn poisson(mean: f64) -> PolicyResult<Poisson> {
    Poisson::new(mean).map_err(|e| PolicyError::Distribution(format!("Poisson({}): {}", mean, e)))
}

/// Smallest `M` with `P(D <= M) >= quantile` for `D ~ Poisson(mean)`.
///
/// A zero mean puts all mass on zero, so the bound is `0`.
pub fn truncation_bound(mean: f64, quantile: f64) -> PolicyResult<u64> {
    check_quantile(quantile)?;
    if !mean.is_finite() || mean < 0.0 {
        return Err(PolicyError::InvalidInput(format!(
            "Poisson mean must be finite and non-negative, got {}",
            mean
        )));
    }
    if mean == 0.0 {
        return Ok(0);
    }

    let dist = poisson(mean)?;

    // The quantile sits near the mean, so walk from there.
    let mut k = mean.floor() as u64;
    while k > 0 && dist.cdf(k - 1) >= quantile {
        k -= 1;
    }
    while dist.cdf(k) < quantile {
        k += 1;
    }
    Ok(k)
}

/// Truncated probability table for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodDemandPmf {
    bound: u64,
    probs: Vec<f64>,
}

impl PeriodDemandPmf {
    pub fn new(mean: f64, quantile: f64) -> PolicyResult<Self> {
        let probs = pmf(mean, quantile)?;
        Ok(Self {
            bound: probs.len() as u64 - 1,
            probs,
        })
    }

    /// Largest demand value in the support (M_t).
    pub fn bound(&self) -> u64 {
        self.bound
    }

    /// Weight of demand `d`, or zero outside the support.
    pub fn prob(&self, d: u64) -> f64 {
        self.probs.get(d as usize).copied().unwrap_or(0.0)
    }

    /// `(demand, weight)` pairs over the support.
    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.probs.iter().enumerate().map(|(d, &w)| (d as i64, w))
    }
}

/// Entry `k` is `PoissonPMF(mean, k) / quantile` for `k` in `0..=M`.
pub fn pmf(mean: f64, quantile: f64) -> PolicyResult<Vec<f64>> {
    let bound = truncation_bound(mean, quantile)?;
    if mean == 0.0 {
        return Ok(vec![1.0 / quantile]);
    }

    let dist = poisson(mean)?;
    Ok((0..=bound).map(|k| dist.pmf(k) / quantile).collect())
}
