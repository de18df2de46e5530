// src/model/instance.rs

use crate::error::{PolicyError, PolicyResult};
use serde::Serialize;

/// A single-item, periodic-review lot sizing problem with backorders.
///
/// Demand in period `t` is Poisson with mean `demand[t]`; the horizon is
/// `demand.len()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemInstance {
    /// Fixed cost charged whenever an order is placed (K).
    pub fixed_cost: f64,
    /// Cost per unit of positive ending inventory per period (h).
    pub holding_cost: f64,
    /// Cost per unit backordered per period (p).
    pub penalty_cost: f64,
    /// Mean demand per period.
    pub demand: Vec<f64>,
}

impl ProblemInstance {
    /// Validating constructor: costs and means must be finite and non-negative.
    pub fn new(
        fixed_cost: f64,
        holding_cost: f64,
        penalty_cost: f64,
        demand: Vec<f64>,
    ) -> PolicyResult<Self> {
        for (name, value) in [
            ("K", fixed_cost),
            ("h", holding_cost),
            ("p", penalty_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::InvalidInput(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        if let Some((t, mean)) = demand
            .iter()
            .enumerate()
            .find(|(_, m)| !m.is_finite() || **m < 0.0)
        {
            return Err(PolicyError::InvalidInput(format!(
                "demand mean for period {} must be finite and non-negative, got {}",
                t, mean
            )));
        }

        Ok(Self {
            fixed_cost,
            holding_cost,
            penalty_cost,
            demand,
        })
    }

    /// Planning horizon T.
    pub fn horizon(&self) -> usize {
        self.demand.len()
    }

    /// Mean of the aggregate demand over the whole horizon.
    pub fn total_demand(&self) -> f64 {
        self.demand.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn accepts_valid_instance() {
        let inst = ProblemInstance::new(10.0, 1.0, 9.0, vec![3.0, 3.0]).unwrap();
        assert_eq!(inst.horizon(), 2);
        assert_eq!(inst.total_demand(), 6.0);
    }

    #[test]
    fn empty_horizon_is_valid() {
        let inst = ProblemInstance::new(0.0, 0.0, 0.0, vec![]).unwrap();
        assert_eq!(inst.horizon(), 0);
        assert_eq!(inst.total_demand(), 0.0);
    }

    #[rstest]
    #[case(-1.0, 1.0, 1.0)]
    #[case(1.0, f64::NAN, 1.0)]
    #[case(1.0, 1.0, f64::INFINITY)]
    fn rejects_bad_costs(#[case] k: f64, #[case] h: f64, #[case] p: f64) {
        let err = ProblemInstance::new(k, h, p, vec![1.0]).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidInput(_)));
    }

    #[test]
    fn rejects_negative_demand_mean() {
        let err = ProblemInstance::new(1.0, 1.0, 1.0, vec![2.0, -0.5]).unwrap_err();
        assert!(err.to_string().contains("period 1"));
    }
}
