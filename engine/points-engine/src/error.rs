//! Error types for the points engine

use squad_model::ModelError;
use thiserror::Error;

/// Scoring and substitution have no recoverable failures: every error here
/// is a caller bug and is surfaced as-is.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Input contract violation: {reason}")]
    InputContractViolation { reason: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScoringError {
    pub(crate) fn contract(reason: impl Into<String>) -> Self {
        ScoringError::InputContractViolation { reason: reason.into() }
    }
}
