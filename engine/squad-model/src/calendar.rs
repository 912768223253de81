//! Season calendar metadata: deadlines, half-season split and rule events

use crate::error::ModelError;
use crate::player::Gameweek;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which half of the season a gameweek belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonHalf {
    First,
    Second,
}

impl SeasonHalf {
    pub const ALL: [SeasonHalf; 2] = [SeasonHalf::First, SeasonHalf::Second];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonCalendar {
    pub first_gameweek: Gameweek,
    pub last_gameweek: Gameweek,
    /// First gameweek of the second half
    pub half_split_gameweek: Gameweek,
    /// Transfer deadline of each gameweek
    #[serde(with = "gameweek_keys")]
    pub deadlines: BTreeMap<Gameweek, DateTime<Utc>>,
    /// Forced free-transfer balance at the start of a gameweek
    #[serde(with = "gameweek_keys")]
    pub top_ups: BTreeMap<Gameweek, u8>,
}

/// Gameweek-keyed maps written with string keys so TOML can hold them
mod gameweek_keys {
    use crate::player::Gameweek;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, V>(map: &BTreeMap<Gameweek, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_map(map.iter().map(|(gameweek, value)| (gameweek.to_string(), value)))
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<Gameweek, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        BTreeMap::<String, V>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| {
                key.trim()
                    .parse::<Gameweek>()
                    .map(|gameweek| (gameweek, value))
                    .map_err(|_| D::Error::custom(format!("invalid gameweek key '{key}'")))
            })
            .collect()
    }
}

impl Default for SeasonCalendar {
    fn default() -> Self {
        Self {
            first_gameweek: 1,
            last_gameweek: 38,
            half_split_gameweek: 20,
            deadlines: BTreeMap::new(),
            top_ups: BTreeMap::new(),
        }
    }
}

impl SeasonCalendar {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.first_gameweek == 0 || self.last_gameweek < self.first_gameweek {
            return Err(ModelError::contract("calendar has no gameweeks"));
        }
        if !(self.first_gameweek..=self.last_gameweek).contains(&self.half_split_gameweek) {
            return Err(ModelError::contract(format!(
                "half split gameweek {} outside season",
                self.half_split_gameweek
            )));
        }
        if let Some(gw) = self.top_ups.keys().find(|gw| !self.contains(**gw)) {
            return Err(ModelError::contract(format!("top-up at unknown gameweek {gw}")));
        }
        Ok(())
    }

    pub fn contains(&self, gameweek: Gameweek) -> bool {
        (self.first_gameweek..=self.last_gameweek).contains(&gameweek)
    }

    pub fn half_of(&self, gameweek: Gameweek) -> SeasonHalf {
        if gameweek < self.half_split_gameweek {
            SeasonHalf::First
        } else {
            SeasonHalf::Second
        }
    }

    /// Inclusive gameweek range a season half covers
    pub fn window(&self, half: SeasonHalf) -> (Gameweek, Gameweek) {
        match half {
            SeasonHalf::First => (self.first_gameweek, self.half_split_gameweek - 1),
            SeasonHalf::Second => (self.half_split_gameweek, self.last_gameweek),
        }
    }

    pub fn deadline(&self, gameweek: Gameweek) -> Option<DateTime<Utc>> {
        self.deadlines.get(&gameweek).copied()
    }

    /// A gameweek with no published deadline is treated as still open
    pub fn is_before_deadline(&self, gameweek: Gameweek, now: DateTime<Utc>) -> bool {
        self.deadline(gameweek).map_or(true, |deadline| now < deadline)
    }

    pub fn top_up(&self, gameweek: Gameweek) -> Option<u8> {
        self.top_ups.get(&gameweek).copied()
    }

    pub fn with_top_up(mut self, gameweek: Gameweek, balance: u8) -> Self {
        self.top_ups.insert(gameweek, balance);
        self
    }
}
