//! Error types for the squad model

use crate::player::PlayerId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    /// Malformed caller input. Never coerced into something valid.
    #[error("Input contract violation: {reason}")]
    InputContractViolation { reason: String },

    #[error("Unknown player: {player_id}")]
    UnknownPlayer { player_id: PlayerId },

    #[error("Squad rule violated: {reason}")]
    SquadRule { reason: String },

    #[error("Invalid rules: {reason}")]
    InvalidRules { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    pub fn contract(reason: impl Into<String>) -> Self {
        ModelError::InputContractViolation { reason: reason.into() }
    }

    pub fn squad_rule(reason: impl Into<String>) -> Self {
        ModelError::SquadRule { reason: reason.into() }
    }

    pub fn invalid_rules(reason: impl Into<String>) -> Self {
        ModelError::InvalidRules { reason: reason.into() }
    }

    /// True for every variant that signals a caller bug rather than an
    /// unsatisfiable request.
    pub fn is_input_contract(&self) -> bool {
        matches!(
            self,
            ModelError::InputContractViolation { .. }
                | ModelError::InvalidRules { .. }
                | ModelError::UnknownPlayer { .. }
                | ModelError::Serialization(_)
        )
    }
}
