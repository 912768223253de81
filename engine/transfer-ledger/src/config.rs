//! Configuration for the transfer ledger

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Most free transfers that can be banked
    pub max_banked: u8,
    /// Points deducted per transfer beyond the free balance
    pub hit_cost: u8,
    /// Balance a new ledger starts with
    pub initial_balance: u8,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { max_banked: 5, hit_cost: 4, initial_balance: 1 }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.max_banked == 0 {
            return Err(LedgerError::InvalidConfig {
                message: "max_banked must be positive".to_string(),
            });
        }
        if self.initial_balance > self.max_banked {
            return Err(LedgerError::BalanceOutOfRange {
                balance: self.initial_balance,
                max: self.max_banked,
            });
        }
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, LedgerError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LEDGER_*` overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), LedgerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(max) = lookup("LEDGER_MAX_BANKED") {
            self.max_banked = max.parse().map_err(|_| LedgerError::InvalidConfig {
                message: "Invalid LEDGER_MAX_BANKED".to_string(),
            })?;
        }

        if let Some(hit) = lookup("LEDGER_HIT_COST") {
            self.hit_cost = hit.parse().map_err(|_| LedgerError::InvalidConfig {
                message: "Invalid LEDGER_HIT_COST".to_string(),
            })?;
        }
        Ok(())
    }
}
