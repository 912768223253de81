//! Error types for the transfer ledger

use squad_model::Gameweek;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Free transfer balance {balance} outside 0..={max}")]
    BalanceOutOfRange { balance: u8, max: u8 },

    #[error("Top-up to {balance} at gameweek {gameweek} exceeds the maximum of {max}")]
    TopUpOutOfRange { gameweek: Gameweek, balance: u8, max: u8 },

    #[error("Season is over after gameweek {gameweek}")]
    SeasonOver { gameweek: Gameweek },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}
