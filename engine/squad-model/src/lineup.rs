use crate::catalogue::PlayerCatalogue;
use crate::error::ModelError;
use crate::player::PlayerId;
use crate::position::Position;
use crate::rules::{FormationRules, PositionCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A lineup position, carrying the player's playing position so formation
/// checks need no catalogue lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupSlot {
    pub player_id: PlayerId,
    pub position: Position,
}

/// Starting eleven, ordered bench and armbands for one gameweek
///
/// Starter order is the substitution priority among starters; bench order
/// is reserve Keeper first, then outfield reserves by priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineup {
    pub starters: Vec<LineupSlot>,
    pub bench: Vec<LineupSlot>,
    pub captain: PlayerId,
    pub vice_captain: PlayerId,
}

impl Lineup {
    /// Build a lineup from ids, resolving positions from the catalogue
    pub fn from_ids(
        catalogue: &PlayerCatalogue,
        starters: &[PlayerId],
        bench: &[PlayerId],
        captain: PlayerId,
        vice_captain: PlayerId,
    ) -> Result<Self, ModelError> {
        let slot = |id: &PlayerId| -> Result<LineupSlot, ModelError> {
            Ok(LineupSlot { player_id: *id, position: catalogue.player(*id)?.position })
        };
        Ok(Self {
            starters: starters.iter().map(slot).collect::<Result<_, _>>()?,
            bench: bench.iter().map(slot).collect::<Result<_, _>>()?,
            captain,
            vice_captain,
        })
    }

    pub fn starter_counts(&self) -> PositionCounts {
        PositionCounts::from_positions(self.starters.iter().map(|s| s.position))
    }

    pub fn is_starter(&self, id: PlayerId) -> bool {
        self.starters.iter().any(|s| s.player_id == id)
    }

    /// All 15 players, starters first
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.starters.iter().chain(self.bench.iter()).map(|s| s.player_id)
    }

    /// Reject lineups that no formation rule could accept
    pub fn validate(&self, rules: &FormationRules) -> Result<(), ModelError> {
        if self.starters.len() != rules.starters as usize {
            return Err(ModelError::contract(format!(
                "lineup has {} starters, expected {}",
                self.starters.len(),
                rules.starters
            )));
        }
        if !rules.is_valid(&self.starter_counts()) {
            return Err(ModelError::contract(format!(
                "starting formation {:?} is not valid",
                self.starter_counts()
            )));
        }
        if self.bench.len() != usize::from(rules.bench) {
            return Err(ModelError::contract(format!(
                "lineup has {} reserves, expected {}",
                self.bench.len(),
                rules.bench
            )));
        }
        match self.bench.split_first() {
            Some((keeper, outfield)) => {
                if keeper.position != Position::Keeper {
                    return Err(ModelError::contract("first bench slot must be the reserve keeper"));
                }
                if outfield.iter().any(|s| s.position == Position::Keeper) {
                    return Err(ModelError::contract("outfield bench slot holds a keeper"));
                }
            }
            None => return Err(ModelError::contract("lineup has an empty bench")),
        }
        let unique: BTreeSet<PlayerId> = self.player_ids().collect();
        if unique.len() != self.starters.len() + self.bench.len() {
            return Err(ModelError::contract("lineup lists a player twice"));
        }
        if self.captain == self.vice_captain {
            return Err(ModelError::contract("captain and vice-captain must differ"));
        }
        if !self.is_starter(self.captain) || !self.is_starter(self.vice_captain) {
            return Err(ModelError::contract("captain and vice-captain must be starters"));
        }
        Ok(())
    }
}
