// src/strategy/recursion.rs

//! Backward induction for the finite-horizon (s, S) inventory problem.
//!
//! Scarf (1960) showed that when the one-period no-order cost is K-convex the
//! optimal policy in every period is of (s, S) type. The recursion below
//! exploits this: rather than minimising over all order quantities at every
//! level, it scans the no-order cost downward from the top of the grid and
//! stops once the cost exceeds its running minimum by more than `K`.
//!
//! # Per-period steps
//! 1. `G_t(i) = sum_d pmf_t[d] * stage(i - d)` where `stage(x)` charges
//!    `h*x` for `x > 0` and `p*(-x)` for `x <= 0`, plus the next period's
//!    value at `x` clipped to the grid.
//! 2. Scan `i = max-1, max-2, ..`; `S_t` is the lowest level attaining the
//!    running minimum, `s_t` the first level with `G_t(i) > min + K`.
//! 3. For `i <= s_t` the value is `G_t(S_t) + K`; above `s_t` it is `G_t(i)`.

use crate::error::{PolicyError, PolicyResult, TimeoutPoint};
use crate::model::demand::PeriodDemandPmf;
use crate::model::instance::ProblemInstance;
use crate::model::state_space::{InventoryStateSpace, ValueFunction};
use crate::simulation::config::{Deadline, SolverConfig};
use crate::strategy::traits::Thresholds;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Levels evaluated between two deadline checks.
const DEADLINE_STRIDE: usize = 256;

/// Result of a solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyOutput {
    #[serde(flatten)]
    pub thresholds: Thresholds,
    /// Optimal expected cost from period 0 for every starting level (Cn).
    pub cost_to_go: ValueFunction,
    /// Period-0 no-order cost, Scarf's G function (Gn).
    pub no_order_cost: ValueFunction,
}

impl PolicyOutput {
    /// Optimal expected cost starting the horizon with `inventory` on hand.
    pub fn expected_cost(&self, inventory: i64) -> Option<f64> {
        self.cost_to_go.get(inventory)
    }

    pub fn state_space(&self) -> InventoryStateSpace {
        self.cost_to_go.space()
    }
}

/// Expected cost of ending a period at each level when nothing is ordered.
#[derive(Debug, Clone, Copy)]
pub struct StageCost<'a> {
    pub space: InventoryStateSpace,
    pub holding_cost: f64,
    pub penalty_cost: f64,
    pub demand: &'a PeriodDemandPmf,
    /// Value function of the following period.
    pub continuation: &'a ValueFunction,
}

impl StageCost<'_> {
    /// Immediate cost plus continuation after demand takes inventory to `x`.
    ///
    /// `x` may fall outside the grid; the continuation is then read at the
    /// nearest boundary while the immediate cost still uses `x` itself.
    pub fn stage(&self, x: i64) -> f64 {
        let (lo, hi) = (self.space.min_level(), self.space.max_level());
        if x >= hi {
            self.holding_cost * x as f64 + self.continuation.at(hi)
        } else if x <= lo {
            self.penalty_cost * (-x) as f64 + self.continuation.at(lo)
        } else if x > 0 {
            self.holding_cost * x as f64 + self.continuation.at(x)
        } else {
            self.penalty_cost * (-x) as f64 + self.continuation.at(x)
        }
    }

    /// `G(level)`: expectation of `stage(level - d)` over the demand table.
    pub fn cost(&self, level: i64) -> f64 {
        self.demand
            .iter()
            .map(|(d, weight)| weight * self.stage(level - d))
            .sum()
    }
}

/// Outcome of the downward scan for one period.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScanResult {
    reorder_point: i64,
    order_up_to: i64,
    min_cost: f64,
}

/// Fills `current` with `G` for every level above the reorder point and
/// returns the thresholds.
fn scan_thresholds(
    stage: &StageCost<'_>,
    fixed_cost: f64,
    period: usize,
    current: &mut ValueFunction,
    deadline: &Deadline,
) -> PolicyResult<ScanResult> {
    let space = stage.space;
    let top = space.max_level();
    current.set(top, stage.cost(top));

    let mut min_cost = f64::INFINITY;
    let mut order_up_to = top;

    // The top level seeds the value function but never competes for S.
    for (scanned, level) in (space.min_level()..top).rev().enumerate() {
        if scanned % DEADLINE_STRIDE == 0 {
            deadline.check(TimeoutPoint::Period(period))?;
        }
        let cost = stage.cost(level);
        current.set(level, cost);

        if cost <= min_cost {
            min_cost = cost;
            order_up_to = level;
        }
        if cost > min_cost + fixed_cost {
            return Ok(ScanResult {
                reorder_point: level,
                order_up_to,
                min_cost,
            });
        }
    }

    warn!(
        period,
        min_level = space.min_level(),
        "no-order cost never rose K above its minimum; scan left the grid"
    );
    Err(PolicyError::PolicyInfeasible {
        period,
        level: space.min_level(),
    })
}

/// Solves with the default truncation quantile and no deadline.
pub fn solve(instance: &ProblemInstance) -> PolicyResult<PolicyOutput> {
    solve_with(instance, &SolverConfig::default())
}

/// Runs the backward induction with the deadline taken from `config.timeout`.
pub fn solve_with(instance: &ProblemInstance, config: &SolverConfig) -> PolicyResult<PolicyOutput> {
    solve_until(instance, config, &Deadline::start(config.timeout))
}

/// Runs the backward induction from the last period to the first.
///
/// `deadline` is checked at the start of every period and every
/// few hundred levels inside it, so a single wide period cannot overrun
/// the budget. `config.timeout` is ignored here.
pub fn solve_until(
    instance: &ProblemInstance,
    config: &SolverConfig,
    deadline: &Deadline,
) -> PolicyResult<PolicyOutput> {
    let horizon = instance.horizon();

    let space =
        InventoryStateSpace::for_total_demand(instance.total_demand(), config.quantile, config.max_levels)?;
    let tables = instance
        .demand
        .iter()
        .map(|&mean| PeriodDemandPmf::new(mean, config.quantile))
        .collect::<PolicyResult<Vec<_>>>()?;

    let mut previous = ValueFunction::zeros(space);
    let mut current = ValueFunction::zeros(space);
    let mut no_order_cost = ValueFunction::zeros(space);
    let mut reorder_points = vec![0; horizon];
    let mut order_up_to = vec![0; horizon];

    for t in (0..horizon).rev() {
        deadline.check(TimeoutPoint::Period(t))?;

        let stage = StageCost {
            space,
            holding_cost: instance.holding_cost,
            penalty_cost: instance.penalty_cost,
            demand: &tables[t],
            continuation: &previous,
        };

        let scan = scan_thresholds(&stage, instance.fixed_cost, t, &mut current, deadline)?;
        reorder_points[t] = scan.reorder_point;
        order_up_to[t] = scan.order_up_to;

        if t == 0 {
            no_order_cost.copy_from(&current);
        }
        let ordering_value = scan.min_cost + instance.fixed_cost;
        // Ordering region includes s itself.
        for (filled, level) in (space.min_level()..=scan.reorder_point).enumerate() {
            if filled % DEADLINE_STRIDE == 0 {
                deadline.check(TimeoutPoint::Period(t))?;
            }
            current.set(level, ordering_value);
            if t == 0 {
                no_order_cost.set(level, stage.cost(level));
            }
        }

        debug!(
            period = t,
            reorder_point = scan.reorder_point,
            order_up_to = scan.order_up_to,
            demand_bound = tables[t].bound(),
            "period solved"
        );
        previous.copy_from(&current);
    }

    info!(
        horizon,
        levels = space.len(),
        elapsed_ms = deadline.elapsed().as_millis() as u64,
        "policy computed"
    );

    Ok(PolicyOutput {
        thresholds: Thresholds {
            reorder_points,
            order_up_to,
        },
        cost_to_go: previous,
        no_order_cost,
    })
}
