// src/io/request.rs

//! JSON request/response contract for the policy service.
//!
//! Request: `{"K": number, "h": number, "p": number, "d": [positive integers]}`.
//! Response: `{"optCost", "solTime", "s", "S"}`, or `{"error": message}`.
//! The handlers are transport-agnostic; any boundary (HTTP, CLI, batch) can
//! feed them a body and serialize what comes back.

use crate::error::{PolicyError, PolicyResult};
use crate::model::instance::ProblemInstance;
use crate::simulation::config::{Deadline, SimulationConfig, SolverConfig};
use crate::simulation::engine::{simulate_until, SimulationSummary};
use crate::strategy::implementations::SsPolicy;
use crate::strategy::recursion::{solve_with, PolicyOutput};
use crate::strategy::traits::{ReorderPointSolver, Thresholds};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::warn;

/// Wall-clock budget applied when the caller does not set one.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(120);

pub const INVALID_INPUT_MESSAGE: &str = "Invalid input data";
pub const TIMEOUT_MESSAGE: &str = "Computation timed out";

/// A validated request body.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveRequest {
    pub fixed_cost: f64,
    pub holding_cost: f64,
    pub penalty_cost: f64,
    pub demand: Vec<u64>,
}

impl SolveRequest {
    pub fn parse(body: &str) -> PolicyResult<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| PolicyError::InvalidInput(format!("malformed JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Checks the shape: an object with numeric `K`, `h`, `p` and a list `d`
    /// of strictly positive integers (`2.0` is not an integer here).
    pub fn from_value(value: &Value) -> PolicyResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| PolicyError::InvalidInput("body must be a JSON object".to_string()))?;

        let number = |key: &str| {
            obj.get(key)
                .and_then(Value::as_f64)
                .ok_or_else(|| PolicyError::InvalidInput(format!("`{}` must be a number", key)))
        };
        let fixed_cost = number("K")?;
        let holding_cost = number("h")?;
        let penalty_cost = number("p")?;

        let list = obj
            .get("d")
            .and_then(Value::as_array)
            .ok_or_else(|| PolicyError::InvalidInput("`d` must be a list".to_string()))?;
        let demand = list
            .iter()
            .enumerate()
            .map(|(t, v)| match v.as_u64() {
                Some(d) if d > 0 => Ok(d),
                _ => Err(PolicyError::InvalidInput(format!(
                    "`d[{}]` must be a positive integer, got {}",
                    t, v
                ))),
            })
            .collect::<PolicyResult<Vec<_>>>()?;

        Ok(Self {
            fixed_cost,
            holding_cost,
            penalty_cost,
            demand,
        })
    }

    pub fn to_instance(&self) -> PolicyResult<ProblemInstance> {
        ProblemInstance::new(
            self.fixed_cost,
            self.holding_cost,
            self.penalty_cost,
            self.demand.iter().map(|&d| d as f64).collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResponse {
    #[serde(rename = "optCost")]
    pub opt_cost: f64,
    /// Seconds, rounded to two decimals.
    #[serde(rename = "solTime")]
    pub sol_time: f64,
    pub s: Vec<i64>,
    #[serde(rename = "S")]
    pub order_up_to: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Solved(SolveResponse),
    Error { error: String },
}

impl Response {
    fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

impl From<PolicyError> for Response {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::InvalidInput(_) => Response::error(INVALID_INPUT_MESSAGE),
            PolicyError::ComputationTimeout { .. } => Response::error(TIMEOUT_MESSAGE),
            other => {
                warn!(error = %other, "request failed");
                Response::error(other.to_string())
            }
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Parses and validates a request body into a problem instance.
pub fn parse_instance(body: &str) -> PolicyResult<ProblemInstance> {
    SolveRequest::parse(body)
        .and_then(|req| req.to_instance())
        .map_err(|e| {
            warn!(error = %e, "rejected request");
            e
        })
}

/// `config` with the default deadline filled in when it has none.
pub fn with_default_deadline(config: &SolverConfig) -> SolverConfig {
    SolverConfig {
        timeout: config.timeout.or(Some(DEFAULT_DEADLINE)),
        ..config.clone()
    }
}

/// Runs the dynamic program and measures it in seconds.
pub fn solve_timed(
    instance: &ProblemInstance,
    config: &SolverConfig,
) -> PolicyResult<(PolicyOutput, f64)> {
    let started = Instant::now();
    let out = solve_with(instance, config)?;
    Ok((out, started.elapsed().as_secs_f64()))
}

/// Thresholds from some solver together with their simulated cost.
#[derive(Debug, Clone)]
pub struct SimulatedSolution {
    pub thresholds: Thresholds,
    pub summary: SimulationSummary,
    /// Seconds spent in the solver; simulation time is excluded.
    pub solve_secs: f64,
}

/// Solves and then simulates, both under the one `deadline`.
pub fn simulate_timed(
    instance: &ProblemInstance,
    solver: &dyn ReorderPointSolver,
    sim: &SimulationConfig,
    deadline: &Deadline,
) -> PolicyResult<SimulatedSolution> {
    let started = Instant::now();
    let thresholds = solver.reorder_points_until(instance, deadline)?;
    let solve_secs = started.elapsed().as_secs_f64();

    let policy = SsPolicy::new(thresholds)?;
    let summary = simulate_until(instance, &policy, sim, deadline)?;
    Ok(SimulatedSolution {
        thresholds: policy.thresholds().clone(),
        summary,
        solve_secs,
    })
}

impl Response {
    /// `optCost` is the expected cost from zero starting inventory.
    pub fn from_solution(out: &PolicyOutput, secs: f64) -> Self {
        match out.expected_cost(0) {
            Some(opt_cost) => Response::Solved(SolveResponse {
                opt_cost,
                sol_time: round2(secs),
                s: out.thresholds.reorder_points.clone(),
                order_up_to: out.thresholds.order_up_to.clone(),
            }),
            None => Response::error("zero inventory is outside the state space"),
        }
    }

    pub fn from_simulation(solution: &SimulatedSolution) -> Self {
        Response::Solved(SolveResponse {
            opt_cost: round2(solution.summary.mean_cost),
            sol_time: round2(solution.solve_secs),
            s: solution.thresholds.reorder_points.clone(),
            order_up_to: solution.thresholds.order_up_to.clone(),
        })
    }
}

/// Solves with the dynamic program under the default deadline unless
/// `config` sets its own.
pub fn handle_solve(body: &str, config: &SolverConfig) -> Response {
    let result = parse_instance(body)
        .and_then(|instance| solve_timed(&instance, &with_default_deadline(config)));
    match result {
        Ok((out, secs)) => Response::from_solution(&out, secs),
        Err(e) => e.into(),
    }
}

/// Gets thresholds from `solver` and reports their simulated mean cost,
/// starting from `sim.initial_inventory`.
///
/// Solver and simulation share one budget, [`DEFAULT_DEADLINE`] unless
/// `timeout` is given.
pub fn handle_solve_simulated(
    body: &str,
    solver: &dyn ReorderPointSolver,
    sim: &SimulationConfig,
    timeout: Option<Duration>,
) -> Response {
    let deadline = Deadline::start(Some(timeout.unwrap_or(DEFAULT_DEADLINE)));
    let result = parse_instance(body)
        .and_then(|instance| simulate_timed(&instance, solver, sim, &deadline));
    match result {
        Ok(solution) => Response::from_simulation(&solution),
        Err(e) => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::implementations::ScarfSolver;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn parses_valid_body() {
        let req = SolveRequest::parse(r#"{"K": 10.0, "h": 1, "p": 9.5, "d": [3, 3]}"#).unwrap();
        assert_eq!(req.fixed_cost, 10.0);
        assert_eq!(req.holding_cost, 1.0);
        assert_eq!(req.demand, vec![3, 3]);
    }

    #[rstest]
    #[case(r#"[1, 2]"#)]
    #[case(r#"{"h": 1.0, "p": 9.0, "d": [3]}"#)]
    #[case(r#"{"K": "10", "h": 1.0, "p": 9.0, "d": [3]}"#)]
    #[case(r#"{"K": 10.0, "h": 1.0, "p": 9.0, "d": 3}"#)]
    #[case(r#"{"K": 10.0, "h": 1.0, "p": 9.0, "d": [3, 0]}"#)]
    #[case(r#"{"K": 10.0, "h": 1.0, "p": 9.0, "d": [3, -2]}"#)]
    #[case(r#"{"K": 10.0, "h": 1.0, "p": 9.0, "d": [2.5]}"#)]
    #[case(r#"{"K": 10.0, "h": 1.0, "p": 9.0, "d": [2.0]}"#)]
    #[case(r#"{"K": -1.0, "h": 1.0, "p": 9.0, "d": [2]}"#)]
    #[case(r#"not json"#)]
    fn invalid_bodies_get_invalid_input_response(#[case] body: &str) {
        let resp = handle_solve(body, &SolverConfig::default());
        assert_eq!(
            resp,
            Response::Error {
                error: INVALID_INPUT_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn solve_response_has_expected_shape() {
        let resp = handle_solve(
            r#"{"K": 10.0, "h": 1.0, "p": 9.0, "d": [3, 3]}"#,
            &SolverConfig::default(),
        );
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["s"], json!([2, 1]));
        assert_eq!(value["S"], json!([8, 5]));
        assert!(value["optCost"].as_f64().unwrap() > 0.0);
        assert!(value["solTime"].as_f64().unwrap() >= 0.0);
    }

    #[test]
    fn empty_demand_list_solves_to_zero_cost() {
        let resp = handle_solve(r#"{"K": 1.0, "h": 1.0, "p": 1.0, "d": []}"#, &SolverConfig::default());
        assert_eq!(
            resp,
            Response::Solved(SolveResponse {
                opt_cost: 0.0,
                sol_time: 0.0,
                s: vec![],
                order_up_to: vec![],
            })
        );
    }

    #[test]
    fn timeout_is_reported_distinctly() {
        let config = SolverConfig {
            timeout: Some(Duration::ZERO),
            ..SolverConfig::default()
        };
        let resp = handle_solve(r#"{"K": 10.0, "h": 1.0, "p": 9.0, "d": [3, 3]}"#, &config);
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"error": TIMEOUT_MESSAGE})
        );
    }

    #[test]
    fn infeasible_scan_surfaces_as_error() {
        let resp = handle_solve(
            r#"{"K": 1000000000.0, "h": 1.0, "p": 4.0, "d": [2]}"#,
            &SolverConfig::default(),
        );
        match resp {
            Response::Error { error } => assert!(error.contains("infeasible")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[derive(Debug)]
    struct FixedSolver;

    impl ReorderPointSolver for FixedSolver {
        fn reorder_points(&self, instance: &ProblemInstance) -> PolicyResult<Thresholds> {
            Ok(Thresholds {
                reorder_points: vec![2; instance.horizon()],
                order_up_to: vec![8; instance.horizon()],
            })
        }
    }

    #[test]
    fn simulated_handler_uses_any_solver() {
        let sim = SimulationConfig {
            runs: 200,
            seed: Some(11),
            initial_inventory: 0,
        };
        let body = r#"{"K": 10.0, "h": 1.0, "p": 9.0, "d": [3, 3]}"#;

        let resp = handle_solve_simulated(body, &FixedSolver, &sim, None);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["s"], json!([2, 2]));
        assert_eq!(value["S"], json!([8, 8]));

        let resp = handle_solve_simulated(body, &ScarfSolver::default(), &sim, None);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["S"], json!([8, 5]));
        let cost = value["optCost"].as_f64().unwrap();
        assert_eq!(cost, round2(cost));
    }

    #[test]
    fn simulated_handler_rejects_bad_shape() {
        let resp = handle_solve_simulated(
            r#"{"K": 10.0, "h": 1.0, "p": 9.0}"#,
            &ScarfSolver::default(),
            &SimulationConfig::default(),
            None,
        );
        assert!(resp.is_error());
    }

    #[test]
    fn simulated_handler_times_out_like_solve() {
        let sim = SimulationConfig {
            runs: 200,
            seed: Some(11),
            initial_inventory: 0,
        };
        let body = r#"{"K": 10.0, "h": 1.0, "p": 9.0, "d": [3, 3]}"#;
        let timed_out = json!({"error": TIMEOUT_MESSAGE});

        let expired = Some(Duration::ZERO);
        let resp = handle_solve_simulated(body, &ScarfSolver::default(), &sim, expired);
        assert_eq!(serde_json::to_value(&resp).unwrap(), timed_out);

        // A solver with no deadline of its own still cannot overrun it.
        let resp = handle_solve_simulated(body, &FixedSolver, &sim, expired);
        assert_eq!(serde_json::to_value(&resp).unwrap(), timed_out);
    }
}
