//! Points Engine - match scoring and final lineup resolution
//!
//! Three pure components:
//! - `ScoringCalculator`: one player's match statistics to points
//! - `allocate_bonus`: bonus points from the ranked bonus-point score
//! - `SubstitutionResolver`: starting eleven + bench + appearances to the
//!   lineup that actually scores

pub mod bonus;
pub mod calculator;
pub mod config;
pub mod error;
pub mod substitution;

pub use bonus::{allocate_bonus, BonusAward};
pub use calculator::{compute_match_points, PointsBreakdown, ScoringCalculator};
pub use config::{PerPosition, ScoringRules};
pub use error::ScoringError;
pub use substitution::{
    resolve_final_lineup, Appearances, FinalLineup, Substitution, SubstitutionResolver,
};

// Result type alias
pub type Result<T> = std::result::Result<T, ScoringError>;
