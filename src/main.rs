use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scarf_policy::io::reporting;
use scarf_policy::io::request::{
    parse_instance, simulate_timed, solve_timed, Response, DEFAULT_DEADLINE,
};
use scarf_policy::simulation::config::{
    Deadline, SimulationConfig, SolverConfig, DEFAULT_QUANTILE,
};
use scarf_policy::simulation::engine::trace_policy;
use scarf_policy::strategy::implementations::{ScarfSolver, SsPolicy};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Optimal (s, S) policies for nonstationary stochastic lot sizing.
#[derive(Parser)]
#[command(name = "scarf-policy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Truncation quantile for Poisson demand
    #[arg(long, global = true, default_value_t = DEFAULT_QUANTILE)]
    quantile: f64,

    /// Wall-clock limit for solving (and simulating), in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_DEADLINE.as_secs())]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the optimal policy and its expected cost
    Solve {
        /// Request file: {"K": .., "h": .., "p": .., "d": [..]}
        #[arg(short, long)]
        input: PathBuf,

        /// Write the per-period (s, S) table to this CSV file
        #[arg(long)]
        policy_csv: Option<PathBuf>,
    },

    /// Compute the policy and estimate its cost by simulation
    Simulate {
        /// Request file: {"K": .., "h": .., "p": .., "d": [..]}
        #[arg(short, long)]
        input: PathBuf,

        /// Number of simulated horizons
        #[arg(short, long, default_value_t = 10_000)]
        runs: usize,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Net inventory at the start of the horizon
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        initial_inventory: i64,

        /// Write one simulated horizon, period by period, to this CSV file
        #[arg(long)]
        trace_csv: Option<PathBuf>,
    },
}

fn print_response(response: &Response) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let solver_config = SolverConfig {
        quantile: cli.quantile,
        timeout: Some(Duration::from_secs(cli.timeout_secs)),
        ..SolverConfig::default()
    };

    match cli.command {
        Commands::Solve { input, policy_csv } => {
            let body = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let instance = match parse_instance(&body) {
                Ok(instance) => instance,
                Err(e) => return print_response(&e.into()),
            };

            match solve_timed(&instance, &solver_config) {
                Ok((out, secs)) => {
                    print_response(&Response::from_solution(&out, secs))?;
                    if let Some(path) = policy_csv {
                        reporting::write_policy_table(&path, &instance, &out.thresholds)?;
                    }
                }
                Err(e) => print_response(&e.into())?,
            }
        }
        Commands::Simulate {
            input,
            runs,
            seed,
            initial_inventory,
            trace_csv,
        } => {
            let body = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let instance = match parse_instance(&body) {
                Ok(instance) => instance,
                Err(e) => return print_response(&e.into()),
            };
            let sim_config = SimulationConfig {
                runs,
                seed,
                initial_inventory,
            };
            let deadline = Deadline::start(solver_config.timeout);
            let solver = ScarfSolver::new(solver_config);

            let solution = match simulate_timed(&instance, &solver, &sim_config, &deadline) {
                Ok(solution) => solution,
                Err(e) => return print_response(&e.into()),
            };
            print_response(&Response::from_simulation(&solution))?;

            let summary = &solution.summary;
            info!(
                runs = summary.runs,
                mean = summary.mean_cost,
                std_dev = summary.std_dev_cost,
                p10 = summary.percentile_10,
                p50 = summary.percentile_50,
                p90 = summary.percentile_90,
                "simulated cost distribution"
            );

            if let Some(path) = trace_csv {
                let policy = SsPolicy::new(solution.thresholds)?;
                let history = trace_policy(&instance, &policy, &sim_config)?;
                reporting::write_trace(&path, &history)?;
            }
        }
    }

    Ok(())
}
