//! Squad Optimizer - constrained squad selection
//!
//! Picks a 15-player squad, or a small set of transfers from the current
//! squad, that maximises projected points subject to the budget, position
//! quotas, the per-club cap and a valid starting formation.
//!
//! Fresh builds check feasibility exactly (min-cost flow over quotas and
//! club caps) and then search heuristically; weekly re-optimisation is a
//! bounded local search over single and paired swaps.

pub mod config;
pub mod error;
pub mod flow;
pub mod lineup;
pub mod optimizer;
pub mod search;

pub use config::OptimizerConfig;
pub use error::{InfeasibilityReason, OptimizeError};
pub use lineup::{select_lineup, LineupChoice, Objective, ValueTable};
pub use optimizer::{OptimizeRequest, Selection, SquadOptimizer};
pub use search::{ScoredMove, SwapMove};

// Result type alias
pub type Result<T> = std::result::Result<T, OptimizeError>;
