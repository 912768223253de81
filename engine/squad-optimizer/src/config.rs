//! Configuration for the squad optimizer

use crate::error::OptimizeError;
use serde::{Deserialize, Serialize};

/// Search bounds. Larger values trade runtime for solution quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Accepted moves per local search run
    pub max_iterations: usize,

    /// Incoming candidates per position, best by projected value
    pub candidate_pool: usize,

    /// Extra incoming candidates per position, best by value per price
    pub budget_pool: usize,

    /// Also try two-for-two swaps when no single swap improves
    pub pair_swaps: bool,

    /// Incoming candidates per position considered for pair swaps
    pub pair_pool: usize,

    /// Smallest net gain that counts as an improvement
    pub min_gain: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            candidate_pool: 25,
            budget_pool: 10,
            pair_swaps: true,
            pair_pool: 8,
            min_gain: 0.01,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.candidate_pool == 0 {
            return Err(OptimizeError::InvalidConfig {
                message: "candidate_pool must be positive".to_string(),
            });
        }
        if !(self.min_gain >= 0.0) {
            return Err(OptimizeError::InvalidConfig {
                message: "min_gain must be non-negative".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: OptimizerConfig = toml::from_str(&content)?;
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
