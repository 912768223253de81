//! Advisor configuration: every engine setting in one TOML file

use anyhow::{Context, Result};
use gameweek_planner::PlannerConfig;
use points_engine::ScoringRules;
use serde::{Deserialize, Serialize};
use squad_model::{SeasonCalendar, SquadRules};
use squad_optimizer::OptimizerConfig;
use std::path::Path;
use transfer_ledger::LedgerConfig;

/// Main advisor configuration
///
/// Every section is optional in the file and falls back to the game's
/// standard rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub scoring: ScoringRules,
    pub squad: SquadRules,
    pub ledger: LedgerConfig,
    pub optimizer: OptimizerConfig,
    pub planner: PlannerConfig,
    pub calendar: SeasonCalendar,
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: "compact".to_string() }
    }
}

impl AdvisorConfig {
    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Like `load`, reading overrides through `lookup` instead of the
    /// process environment
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::from_toml(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("ADVISOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("ADVISOR_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(width) = lookup("ADVISOR_BEAM_WIDTH") {
            self.planner.beam_width = width.parse().context("Invalid ADVISOR_BEAM_WIDTH")?;
        }
        if let Some(top_k) = lookup("ADVISOR_TOP_K") {
            self.planner.top_k = top_k.parse().context("Invalid ADVISOR_TOP_K")?;
        }
        if let Some(budget) = lookup("ADVISOR_TIME_BUDGET_MS") {
            self.planner.time_budget_ms =
                Some(budget.parse().context("Invalid ADVISOR_TIME_BUDGET_MS")?);
        }
        self.ledger.apply_overrides(&lookup)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.squad.validate()?;
        self.ledger.validate()?;
        self.optimizer.validate()?;
        self.planner.validate()?;
        self.calendar.validate()?;
        Ok(())
    }
}
