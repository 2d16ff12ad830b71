//! Target-controlled infusion: rate solving and scheduling

mod scheduler;
mod solver;

pub use scheduler::{InfusionScheduler, InfusionSeries, TickRecord};
pub use solver::{RateDecision, TciSolver, MAX_SOLVER_ITERS};
