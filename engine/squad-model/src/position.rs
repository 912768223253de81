use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Playing position of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPosition", into = "&'static str")]
pub enum Position {
    Keeper,
    Defender,
    Midfielder,
    Forward,
}

/// Wire form of a position: either the numeric element-type code (1..=4)
/// or a name such as "GKP", "DEF", "Midfielder".
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPosition {
    Code(u8),
    Name(String),
}

impl Position {
    pub const ALL: [Position; 4] =
        [Position::Keeper, Position::Defender, Position::Midfielder, Position::Forward];

    /// Parse the numeric element-type code used by player catalogues
    pub fn from_code(code: u8) -> Result<Self, ModelError> {
        match code {
            1 => Ok(Position::Keeper),
            2 => Ok(Position::Defender),
            3 => Ok(Position::Midfielder),
            4 => Ok(Position::Forward),
            other => Err(ModelError::contract(format!("unrecognized position code {other}"))),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Position::Keeper => 1,
            Position::Defender => 2,
            Position::Midfielder => 3,
            Position::Forward => 4,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Position::Keeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    pub fn is_outfield(self) -> bool {
        self != Position::Keeper
    }

    /// Index into per-position arrays, in `ALL` order
    pub fn index(self) -> usize {
        self.code() as usize - 1
    }
}

impl FromStr for Position {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GK" | "GKP" | "KEEPER" | "GOALKEEPER" => Ok(Position::Keeper),
            "DEF" | "DEFENDER" => Ok(Position::Defender),
            "MID" | "MIDFIELDER" => Ok(Position::Midfielder),
            "FWD" | "FW" | "FORWARD" => Ok(Position::Forward),
            _ => Err(ModelError::contract(format!("unrecognized position '{s}'"))),
        }
    }
}

impl TryFrom<RawPosition> for Position {
    type Error = ModelError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        match raw {
            RawPosition::Code(code) => Position::from_code(code),
            RawPosition::Name(name) => name.parse(),
        }
    }
}

impl From<Position> for &'static str {
    fn from(position: Position) -> Self {
        position.short_name()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
