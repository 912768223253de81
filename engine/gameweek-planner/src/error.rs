//! Error types for the gameweek planner

use chip_tracker::ChipError;
use squad_model::ModelError;
use squad_optimizer::{InfeasibilityReason, OptimizeError};
use thiserror::Error;
use transfer_ledger::LedgerError;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Input contract violation: {reason}")]
    InputContractViolation { reason: String },

    #[error("No feasible plan: {0}")]
    Infeasible(InfeasibilityReason),

    #[error("Optimizer error: {0}")]
    Optimize(OptimizeError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Chip error: {0}")]
    Chip(#[from] ChipError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl PlanError {
    pub(crate) fn contract(reason: impl Into<String>) -> Self {
        PlanError::InputContractViolation { reason: reason.into() }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, PlanError::Infeasible(_))
    }
}

impl From<OptimizeError> for PlanError {
    fn from(err: OptimizeError) -> Self {
        match err {
            OptimizeError::InputContractViolation { reason } => {
                PlanError::InputContractViolation { reason }
            }
            OptimizeError::Infeasible(reason) => PlanError::Infeasible(reason),
            other => PlanError::Optimize(other),
        }
    }
}
