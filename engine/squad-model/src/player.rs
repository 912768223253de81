use crate::position::Position;
use crate::price::Price;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Gameweek number within a season (1-based)
pub type Gameweek = u16;

/// Stable catalogue identity of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Real-world club a player belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u16);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team-{}", self.0)
    }
}

/// Availability status published between gameweeks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    /// Chance of playing in percent (0..=100)
    Doubtful { chance: u8 },
    Injured,
    Suspended,
}

impl Availability {
    /// Probability the player takes part at all
    pub fn play_probability(self) -> f64 {
        match self {
            Availability::Available => 1.0,
            Availability::Doubtful { chance } => f64::from(chance.min(100)) / 100.0,
            Availability::Injured | Availability::Suspended => 0.0,
        }
    }
}

/// Raw statistics for one player in one match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchStats {
    pub minutes: u16,
    pub goals_scored: u8,
    pub assists: u8,
    /// No goal conceded while the player was on the pitch
    pub clean_sheet: bool,
    /// Goals conceded while the player was on the pitch
    pub goals_conceded: u8,
    pub own_goals: u8,
    pub penalties_saved: u8,
    pub penalties_missed: u8,
    pub yellow_cards: u8,
    pub red_cards: u8,
    pub saves: u8,
    pub tackles: u8,
    /// Clearances, blocks and interceptions combined
    pub clearances_blocks_interceptions: u8,
    pub recoveries: u8,
    /// Bonus points already allocated for the match (0..=3)
    pub bonus: u8,
}

impl MatchStats {
    /// Played any minutes or was shown a card (e.g. from the bench)
    pub fn appeared(&self) -> bool {
        self.minutes > 0 || self.yellow_cards > 0 || self.red_cards > 0
    }

    /// Combined defensive actions counted towards the defensive contribution
    /// threshold for the given position.
    pub fn defensive_actions(&self, position: Position) -> u32 {
        let base = u32::from(self.tackles) + u32::from(self.clearances_blocks_interceptions);
        match position {
            Position::Keeper | Position::Defender => base,
            Position::Midfielder | Position::Forward => base + u32::from(self.recoveries),
        }
    }
}

/// A player as published in the catalogue snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: TeamId,
    pub price: Price,
    #[serde(default)]
    pub availability: Availability,
    /// Finalised match statistics by gameweek
    #[serde(default)]
    pub history: BTreeMap<Gameweek, MatchStats>,
    /// Externally supplied expected points by future gameweek
    #[serde(default)]
    pub projections: BTreeMap<Gameweek, f64>,
}

impl Player {
    pub fn new(id: u32, name: &str, position: Position, team: u16, price_tenths: i32) -> Self {
        Self {
            id: PlayerId(id),
            name: name.to_string(),
            position,
            team: TeamId(team),
            price: Price::from_tenths(price_tenths),
            availability: Availability::Available,
            history: BTreeMap::new(),
            projections: BTreeMap::new(),
        }
    }

    pub fn with_projection(mut self, gameweek: Gameweek, points: f64) -> Self {
        self.projections.insert(gameweek, points);
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Raw projection for a gameweek, 0.0 when none was supplied
    pub fn projection(&self, gameweek: Gameweek) -> f64 {
        self.projections.get(&gameweek).copied().unwrap_or(0.0)
    }

    /// Projection discounted by the chance of playing.
    ///
    /// Availability is only known for the upcoming gameweek, so the discount
    /// is applied to every future gameweek alike.
    pub fn expected_points(&self, gameweek: Gameweek) -> f64 {
        self.projection(gameweek) * self.availability.play_probability()
    }

    pub fn stats(&self, gameweek: Gameweek) -> Option<&MatchStats> {
        self.history.get(&gameweek)
    }
}
