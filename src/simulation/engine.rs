// src/simulation/engine.rs

use crate::error::{PolicyError, PolicyResult, TimeoutPoint};
use crate::model::instance::ProblemInstance;
use crate::simulation::config::{Deadline, SimulationConfig};
use crate::strategy::traits::ReplenishmentPolicy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson};
use serde::Serialize;
use tracing::debug;

/// Runs played between two deadline checks.
const DEADLINE_STRIDE: usize = 64;

// We make this Serialize so we can write it to CSV later
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRecord {
    pub period: usize,
    pub inventory_start: i64,
    pub order_placed: u64,
    pub demand: u64,
    pub inventory_end: i64,
    pub cost: f64,
}

/// Cost distribution over many simulated horizons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub runs: usize,
    pub mean_cost: f64,
    pub std_dev_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub percentile_10: f64,
    pub percentile_50: f64,
    pub percentile_90: f64,
}

/// Per-period Poisson samplers; a zero mean always yields zero demand.
struct DemandSampler {
    periods: Vec<Option<Poisson<f64>>>,
}

impl DemandSampler {
    fn new(instance: &ProblemInstance) -> PolicyResult<Self> {
        let periods = instance
            .demand
            .iter()
            .map(|&mean| {
                if mean == 0.0 {
                    Ok(None)
                } else {
                    Poisson::new(mean).map(Some).map_err(|e| {
                        PolicyError::Distribution(format!("Poisson({}): {}", mean, e))
                    })
                }
            })
            .collect::<PolicyResult<Vec<_>>>()?;
        Ok(Self { periods })
    }

    fn sample(&self, period: usize, rng: &mut StdRng) -> u64 {
        match &self.periods[period] {
            Some(dist) => dist.sample(rng) as u64,
            None => 0,
        }
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Plays one horizon, calling `record` after every period. Returns total cost.
fn run_horizon(
    instance: &ProblemInstance,
    policy: &dyn ReplenishmentPolicy,
    sampler: &DemandSampler,
    initial_inventory: i64,
    rng: &mut StdRng,
    mut record: impl FnMut(PeriodRecord),
) -> f64 {
    let mut inventory = initial_inventory;
    let mut total = 0.0;

    for period in 0..instance.horizon() {
        let inventory_start = inventory;
        let order = policy.order_quantity(period, inventory);
        let mut cost = 0.0;
        if order > 0 {
            cost += instance.fixed_cost;
        }

        let demand = sampler.sample(period, rng);
        inventory = inventory + order as i64 - demand as i64;

        // Holding on stock, penalty on backorders.
        if inventory > 0 {
            cost += instance.holding_cost * inventory as f64;
        } else {
            cost += instance.penalty_cost * (-inventory) as f64;
        }

        total += cost;
        record(PeriodRecord {
            period,
            inventory_start,
            order_placed: order,
            demand,
            inventory_end: inventory,
            cost,
        });
    }
    total
}

/// Estimates the expected cost of `policy` by Monte-Carlo simulation.
pub fn simulate_policy(
    instance: &ProblemInstance,
    policy: &dyn ReplenishmentPolicy,
    config: &SimulationConfig,
) -> PolicyResult<SimulationSummary> {
    simulate_until(instance, policy, config, &Deadline::unbounded())
}

/// [`simulate_policy`] that gives up once `deadline` has passed.
pub fn simulate_until(
    instance: &ProblemInstance,
    policy: &dyn ReplenishmentPolicy,
    config: &SimulationConfig,
    deadline: &Deadline,
) -> PolicyResult<SimulationSummary> {
    if config.runs == 0 {
        return Err(PolicyError::InvalidInput(
            "simulation needs at least one run".to_string(),
        ));
    }

    let sampler = DemandSampler::new(instance)?;
    let mut rng = rng_for(config.seed);

    let mut costs = Vec::with_capacity(config.runs);
    for run in 0..config.runs {
        if run % DEADLINE_STRIDE == 0 {
            deadline.check(TimeoutPoint::SimulationRun(run))?;
        }
        costs.push(run_horizon(
            instance,
            policy,
            &sampler,
            config.initial_inventory,
            &mut rng,
            |_| {},
        ));
    }

    costs.sort_by(|a, b| a.total_cmp(b));

    let n = costs.len() as f64;
    let mean_cost = costs.iter().sum::<f64>() / n;
    let variance = costs.iter().map(|c| (c - mean_cost).powi(2)).sum::<f64>() / n;

    let percentile = |p: f64| {
        let index = ((p / 100.0) * (n - 1.0)).round() as usize;
        costs[index.min(costs.len() - 1)]
    };

    let summary = SimulationSummary {
        runs: config.runs,
        mean_cost,
        std_dev_cost: variance.sqrt(),
        min_cost: costs[0],
        max_cost: costs[costs.len() - 1],
        percentile_10: percentile(10.0),
        percentile_50: percentile(50.0),
        percentile_90: percentile(90.0),
    };
    debug!(
        runs = summary.runs,
        mean_cost = summary.mean_cost,
        std_dev_cost = summary.std_dev_cost,
        "simulation finished"
    );
    Ok(summary)
}

/// Plays a single horizon and keeps its period-by-period history.
pub fn trace_policy(
    instance: &ProblemInstance,
    policy: &dyn ReplenishmentPolicy,
    config: &SimulationConfig,
) -> PolicyResult<Vec<PeriodRecord>> {
    let sampler = DemandSampler::new(instance)?;
    let mut rng = rng_for(config.seed);
    let mut history = Vec::with_capacity(instance.horizon());
    run_horizon(
        instance,
        policy,
        &sampler,
        config.initial_inventory,
        &mut rng,
        |record| history.push(record),
    );
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::implementations::SsPolicy;
    use crate::strategy::recursion::solve;
    use crate::strategy::traits::Thresholds;

    fn config(runs: usize, seed: u64) -> SimulationConfig {
        SimulationConfig {
            runs,
            seed: Some(seed),
            initial_inventory: 0,
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let inst = ProblemInstance::new(10.0, 1.0, 9.0, vec![3.0, 3.0]).unwrap();
        let policy = SsPolicy::new(solve(&inst).unwrap().thresholds).unwrap();
        let a = simulate_policy(&inst, &policy, &config(500, 7)).unwrap();
        let b = simulate_policy(&inst, &policy, &config(500, 7)).unwrap();
        assert_eq!(a, b);
        assert!(a.min_cost <= a.percentile_50 && a.percentile_50 <= a.max_cost);
    }

    #[test]
    fn simulated_cost_tracks_dp_value() {
        let inst = ProblemInstance::new(10.0, 1.0, 9.0, vec![3.0, 5.0, 2.0, 4.0]).unwrap();
        let out = solve(&inst).unwrap();
        let policy = SsPolicy::new(out.thresholds.clone()).unwrap();
        let summary = simulate_policy(&inst, &policy, &config(20_000, 42)).unwrap();

        let dp = out.expected_cost(0).unwrap();
        let tolerance = 0.05 * dp + 4.0 * summary.std_dev_cost / (summary.runs as f64).sqrt();
        assert!(
            (summary.mean_cost - dp).abs() < tolerance,
            "simulated {} vs dp {}",
            summary.mean_cost,
            dp
        );
    }

    #[test]
    fn zero_demand_never_costs_more_than_initial_holding() {
        let inst = ProblemInstance::new(5.0, 2.0, 3.0, vec![0.0, 0.0]).unwrap();
        let policy = SsPolicy::new(Thresholds {
            reorder_points: vec![-1, -1],
            order_up_to: vec![0, 0],
        })
        .unwrap();
        let cfg = SimulationConfig {
            runs: 10,
            seed: Some(1),
            initial_inventory: 4,
        };
        let summary = simulate_policy(&inst, &policy, &cfg).unwrap();
        assert_eq!(summary.mean_cost, 16.0);
        assert_eq!(summary.std_dev_cost, 0.0);
    }

    #[test]
    fn trace_records_every_period() {
        let inst = ProblemInstance::new(10.0, 1.0, 9.0, vec![3.0, 3.0, 3.0]).unwrap();
        let policy = SsPolicy::new(solve(&inst).unwrap().thresholds).unwrap();
        let history = trace_policy(&inst, &policy, &config(1, 3)).unwrap();
        assert_eq!(history.len(), 3);
        for pair in history.windows(2) {
            assert_eq!(pair[0].inventory_end, pair[1].inventory_start);
        }
        for rec in &history {
            assert_eq!(
                rec.inventory_end,
                rec.inventory_start + rec.order_placed as i64 - rec.demand as i64
            );
        }
    }

    #[test]
    fn zero_runs_is_rejected() {
        let inst = ProblemInstance::new(1.0, 1.0, 1.0, vec![1.0]).unwrap();
        let policy = SsPolicy::new(Thresholds {
            reorder_points: vec![0],
            order_up_to: vec![1],
        })
        .unwrap();
        assert!(simulate_policy(&inst, &policy, &config(0, 1)).is_err());
    }

    #[test]
    fn expired_deadline_stops_simulation() {
        use std::time::Duration;

        let inst = ProblemInstance::new(10.0, 1.0, 9.0, vec![3.0, 3.0]).unwrap();
        let policy = SsPolicy::new(solve(&inst).unwrap().thresholds).unwrap();
        let expired = Deadline::start(Some(Duration::ZERO));
        let err = simulate_until(&inst, &policy, &config(1_000, 5), &expired).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::ComputationTimeout {
                at: TimeoutPoint::SimulationRun(0),
                ..
            }
        ));

        let open = Deadline::start(Some(Duration::from_secs(3600)));
        let bounded = simulate_until(&inst, &policy, &config(1_000, 5), &open).unwrap();
        assert_eq!(bounded, simulate_policy(&inst, &policy, &config(1_000, 5)).unwrap());
    }
}
