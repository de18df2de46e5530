// src/strategy/implementations.rs

use crate::error::{PolicyError, PolicyResult};
use crate::model::instance::ProblemInstance;
use crate::simulation::config::{Deadline, SolverConfig};
use crate::strategy::recursion::{solve_until, solve_with};
use crate::strategy::traits::{ReorderPointSolver, ReplenishmentPolicy, Thresholds};

// =========================================================================
// 1. Scarf Solver (Dynamic Programming)
// =========================================================================

/// Reorder thresholds from the backward-induction recursion.
#[derive(Debug, Clone, Default)]
pub struct ScarfSolver {
    config: SolverConfig,
}

impl ScarfSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl ReorderPointSolver for ScarfSolver {
    fn reorder_points(&self, instance: &ProblemInstance) -> PolicyResult<Thresholds> {
        Ok(solve_with(instance, &self.config)?.thresholds)
    }

    /// `deadline` replaces the configured timeout.
    fn reorder_points_until(
        &self,
        instance: &ProblemInstance,
        deadline: &Deadline,
    ) -> PolicyResult<Thresholds> {
        Ok(solve_until(instance, &self.config, deadline)?.thresholds)
    }
}

// =========================================================================
// 2. (s, S) Policy
// =========================================================================

/// Orders up to `S[t]` whenever net inventory is at or below `s[t]`.
///
/// Past the end of the horizon it never orders.
#[derive(Debug, Clone)]
pub struct SsPolicy {
    thresholds: Thresholds,
}

impl SsPolicy {
    pub fn new(thresholds: Thresholds) -> PolicyResult<Self> {
        let th = &thresholds;
        if th.reorder_points.len() != th.order_up_to.len() {
            return Err(PolicyError::InvalidInput(format!(
                "{} reorder points but {} order-up-to levels",
                th.reorder_points.len(),
                th.order_up_to.len()
            )));
        }
        if let Some(t) = (0..th.horizon()).find(|&t| th.order_up_to[t] < th.reorder_points[t]) {
            return Err(PolicyError::InvalidInput(format!(
                "period {}: S = {} is below s = {}",
                t, th.order_up_to[t], th.reorder_points[t]
            )));
        }
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

impl ReplenishmentPolicy for SsPolicy {
    fn order_quantity(&self, period: usize, inventory: i64) -> u64 {
        let th = &self.thresholds;
        match (th.reorder_points.get(period), th.order_up_to.get(period)) {
            (Some(&s), Some(&big_s)) if inventory <= s => (big_s - inventory) as u64,
            _ => 0,
        }
    }
}
