//! Optimal (s, S) replenishment policies for a single item with
//! nonstationary Poisson demand, after Scarf (1960).
//!
//! The core is [`strategy::recursion::solve`]; everything else is the
//! boundary around it: request handling, simulation and CSV reporting.

pub mod error;
pub mod io;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::{PolicyError, PolicyResult, TimeoutPoint};
pub use model::instance::ProblemInstance;
pub use simulation::config::Deadline;
pub use strategy::recursion::{solve, solve_until, solve_with, PolicyOutput};
pub use strategy::traits::Thresholds;
