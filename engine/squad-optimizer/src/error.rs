//! Error types for the squad optimizer

use squad_model::{ModelError, Position, Price};
use thiserror::Error;
use transfer_ledger::LedgerError;

/// Why no squad can satisfy the constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfeasibilityReason {
    /// Not enough eligible players for a position quota
    PositionQuota { position: Position, needed: u8, available: usize },
    /// Quotas cannot be met without exceeding the per-club cap
    ClubCap,
    /// Even the cheapest valid squad exceeds the budget
    Budget { cheapest: Price, budget: Price },
}

impl std::fmt::Display for InfeasibilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibilityReason::PositionQuota { position, needed, available } => {
                write!(f, "{position} quota needs {needed} players, {available} eligible")
            }
            InfeasibilityReason::ClubCap => write!(f, "quotas cannot be met within the club cap"),
            InfeasibilityReason::Budget { cheapest, budget } => {
                write!(f, "cheapest valid squad costs {cheapest}, budget is {budget}")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Input contract violation: {reason}")]
    InputContractViolation { reason: String },

    /// Reported instead of an invalid squad; the caller may relax and retry
    #[error("No feasible squad: {0}")]
    Infeasible(InfeasibilityReason),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl OptimizeError {
    pub(crate) fn contract(reason: impl Into<String>) -> Self {
        OptimizeError::InputContractViolation { reason: reason.into() }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, OptimizeError::Infeasible(_))
    }
}
