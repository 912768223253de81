use serde::{Deserialize, Serialize};
use std::fmt;

/// The four chip kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipKind {
    Wildcard,
    FreeHit,
    BenchBoost,
    TripleCaptain,
}

impl ChipKind {
    pub const ALL: [ChipKind; 4] =
        [ChipKind::Wildcard, ChipKind::FreeHit, ChipKind::BenchBoost, ChipKind::TripleCaptain];

    /// Chips that make every transfer of the gameweek free
    pub fn waives_transfer_cost(self) -> bool {
        matches!(self, ChipKind::Wildcard | ChipKind::FreeHit)
    }

    pub fn captain_multiplier(chip: Option<ChipKind>) -> u32 {
        match chip {
            Some(ChipKind::TripleCaptain) => 3,
            _ => 2,
        }
    }

    pub fn counts_bench(chip: Option<ChipKind>) -> bool {
        chip == Some(ChipKind::BenchBoost)
    }
}

impl fmt::Display for ChipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChipKind::Wildcard => "Wildcard",
            ChipKind::FreeHit => "Free Hit",
            ChipKind::BenchBoost => "Bench Boost",
            ChipKind::TripleCaptain => "Triple Captain",
        };
        f.write_str(name)
    }
}
