//! Gameweek Planner - transfers and chips over a short horizon
//!
//! Searches sequences of gameweek actions (hold, swap, chip) with a bounded
//! beam. Candidate swaps per gameweek are limited to the optimizer's top
//! ranked moves, so the result is the best plan within that restricted
//! action set rather than a global optimum.

pub mod config;
pub mod error;
pub mod plan;
pub mod planner;

pub use config::{FreeHitBudget, PlannerConfig};
pub use error::PlanError;
pub use plan::{GameweekPlanStep, PlanAction, PlanState, TransferPlan};
pub use planner::{plan_transfers, GameweekPlanner};

// Result type alias
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests;
