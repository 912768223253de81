use crate::player::{Gameweek, PlayerId};
use serde::{Deserialize, Serialize};

/// Cost tag attached to a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferCost {
    Free,
    /// Point deduction for a transfer beyond the free allotment
    Hit { points: u8 },
}

impl TransferCost {
    pub fn points(self) -> u32 {
        match self {
            TransferCost::Free => 0,
            TransferCost::Hit { points } => u32::from(points),
        }
    }
}

/// One player swapped for another ahead of a gameweek deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub gameweek: Gameweek,
    pub player_out: PlayerId,
    pub player_in: PlayerId,
    pub cost: TransferCost,
}
