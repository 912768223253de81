//! Chip Tracker - chip availability and usage across the season
//!
//! Each of the four chip kinds has one instance per season half. An
//! instance moves `Available -> Pending -> Used`; a pending instance can be
//! cancelled back to `Available` until the gameweek deadline passes.

pub mod error;
pub mod tracker;

pub use error::ChipError;
pub use tracker::{ChipEvent, ChipInstance, ChipState, ChipTracker};

// Result type alias
pub type Result<T> = std::result::Result<T, ChipError>;
