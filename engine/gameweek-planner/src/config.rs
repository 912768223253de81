//! Configuration for the gameweek planner

use crate::error::PlanError;
use serde::{Deserialize, Serialize};

/// Money available to a Free Hit rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeHitBudget {
    /// Any squad satisfying quotas and the club cap
    #[default]
    Unconstrained,
    /// Limited to the current squad's selling value
    SquadValue,
}

/// Search bounds for the planner.
///
/// The planner only considers the `top_k` best single or pair swaps per
/// gameweek and keeps `beam_width` partial plans per depth. Raising either
/// finds better plans at a proportional cost in runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub beam_width: usize,
    pub top_k: usize,

    /// Child plans generated before the search stops early
    pub max_expansions: usize,

    /// Wall-clock limit in milliseconds
    pub time_budget_ms: Option<u64>,

    /// Gameweeks of projections used to rank candidate swaps
    pub move_window: u16,

    pub free_hit_budget: FreeHitBudget,

    /// Consider chip activations at all
    pub use_chips: bool,

    /// Expand beam nodes on the rayon pool
    pub parallel: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            beam_width: 8,
            top_k: 6,
            max_expansions: 5_000,
            time_budget_ms: None,
            move_window: 1,
            free_hit_budget: FreeHitBudget::Unconstrained,
            use_chips: true,
            parallel: true,
        }
    }
}

impl PlannerConfig {
    pub const DEFAULT_HORIZON: u16 = 5;
    pub const MAX_HORIZON: u16 = 8;

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.beam_width == 0 {
            return Err(PlanError::InvalidConfig {
                message: "beam_width must be positive".to_string(),
            });
        }
        if self.move_window == 0 {
            return Err(PlanError::InvalidConfig {
                message: "move_window must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PlannerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
