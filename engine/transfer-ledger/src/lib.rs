//! Transfer Ledger - free-transfer balance and hit accounting
//!
//! Tracks how many free transfers are banked, charges point hits for
//! transfers beyond the balance, and waives costs in Wildcard / Free Hit
//! gameweeks without touching the banked balance.

pub mod config;
pub mod error;
pub mod ledger;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use ledger::{LedgerEntry, TransferCharge, TransferLedger};

// Result type alias
pub type Result<T> = std::result::Result<T, LedgerError>;
