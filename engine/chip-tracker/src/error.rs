//! Error types for the chip tracker

use squad_model::{ChipKind, Gameweek, SeasonHalf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChipError {
    #[error("{kind} for the {half:?} half is not available")]
    NotAvailable { kind: ChipKind, half: SeasonHalf },

    #[error("Gameweek {gameweek} is outside the season")]
    OutsideSeason { gameweek: Gameweek },

    #[error("Gameweek {gameweek} already has {chip} active")]
    GameweekAlreadyHasChip { gameweek: Gameweek, chip: ChipKind },

    #[error("Free Hit cannot be played in gameweek {gameweek} straight after another Free Hit")]
    ConsecutiveFreeHit { gameweek: Gameweek },

    #[error("Deadline for gameweek {gameweek} has passed")]
    DeadlinePassed { gameweek: Gameweek },

    #[error("{kind} is not pending in gameweek {gameweek}")]
    NotPending { kind: ChipKind, gameweek: Gameweek },

    #[error("Stored chip state has {count} instances of {kind} for the {half:?} half")]
    MalformedState { kind: ChipKind, half: SeasonHalf, count: usize },
}
