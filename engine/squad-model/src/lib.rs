//! Squad Model - shared types for the squad advisor engine
//!
//! This crate holds the data model every other engine crate works against:
//! players and their per-match statistics, the 15-man squad, the starting
//! lineup, transfers, chips, the rule tables and the season calendar.

pub mod calendar;
pub mod catalogue;
pub mod chip;
pub mod error;
pub mod lineup;
pub mod player;
pub mod position;
pub mod price;
pub mod rules;
pub mod squad;
pub mod transfer;

pub use calendar::{SeasonCalendar, SeasonHalf};
pub use catalogue::PlayerCatalogue;
pub use chip::ChipKind;
pub use error::ModelError;
pub use lineup::{Lineup, LineupSlot};
pub use player::{Availability, Gameweek, MatchStats, Player, PlayerId, TeamId};
pub use position::Position;
pub use price::Price;
pub use rules::{FormationRules, PositionCounts, SquadRules};
pub use squad::{Squad, SquadMember};
pub use transfer::{Transfer, TransferCost};

// Result type alias
pub type Result<T> = std::result::Result<T, ModelError>;
