//! Rule tables for squad composition and formations

use crate::error::ModelError;
use crate::position::Position;
use crate::price::Price;
use serde::{Deserialize, Serialize};

/// Count of players per position, indexed in `Position::ALL` order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCounts {
    pub keepers: u8,
    pub defenders: u8,
    pub midfielders: u8,
    pub forwards: u8,
}

impl PositionCounts {
    pub const fn new(keepers: u8, defenders: u8, midfielders: u8, forwards: u8) -> Self {
        Self { keepers, defenders, midfielders, forwards }
    }

    pub fn from_positions<I: IntoIterator<Item = Position>>(positions: I) -> Self {
        let mut counts = Self::default();
        for position in positions {
            counts.add(position);
        }
        counts
    }

    pub fn get(&self, position: Position) -> u8 {
        match position {
            Position::Keeper => self.keepers,
            Position::Defender => self.defenders,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
        }
    }

    fn slot(&mut self, position: Position) -> &mut u8 {
        match position {
            Position::Keeper => &mut self.keepers,
            Position::Defender => &mut self.defenders,
            Position::Midfielder => &mut self.midfielders,
            Position::Forward => &mut self.forwards,
        }
    }

    pub fn add(&mut self, position: Position) {
        let slot = self.slot(position);
        *slot = slot.saturating_add(1);
    }

    pub fn remove(&mut self, position: Position) {
        let slot = self.slot(position);
        *slot = slot.saturating_sub(1);
    }

    pub fn total(&self) -> u8 {
        self.keepers
            .saturating_add(self.defenders)
            .saturating_add(self.midfielders)
            .saturating_add(self.forwards)
    }
}

/// Formation rules for the starting eleven and the bench
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationRules {
    pub starters: u8,
    pub keepers: u8,
    pub min_defenders: u8,
    pub min_forwards: u8,
    /// Reserves, the reserve keeper first
    pub bench: u8,
}

impl Default for FormationRules {
    fn default() -> Self {
        Self { starters: 11, keepers: 1, min_defenders: 3, min_forwards: 1, bench: 4 }
    }
}

impl FormationRules {
    pub fn is_valid(&self, counts: &PositionCounts) -> bool {
        counts.total() == self.starters
            && counts.keepers == self.keepers
            && counts.defenders >= self.min_defenders
            && counts.forwards >= self.min_forwards
    }

    /// Whether replacing `out` by `incoming` keeps a valid formation valid
    pub fn allows_swap(&self, counts: &PositionCounts, out: Position, incoming: Position) -> bool {
        let mut next = *counts;
        next.remove(out);
        next.add(incoming);
        self.is_valid(&next)
    }
}

/// Squad composition rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadRules {
    /// Exact number of players per position
    pub quotas: PositionCounts,
    /// Maximum players sharing one real-world club
    pub max_per_team: u8,
    /// Budget for a fresh squad
    pub budget_cap: Price,
    pub formation: FormationRules,
}

impl Default for SquadRules {
    fn default() -> Self {
        Self {
            quotas: PositionCounts::new(2, 5, 5, 3),
            max_per_team: 3,
            budget_cap: Price::from_tenths(1000),
            formation: FormationRules::default(),
        }
    }
}

impl SquadRules {
    pub fn squad_size(&self) -> usize {
        self.quotas.total() as usize
    }

    pub fn bench_size(&self) -> usize {
        usize::from(self.formation.bench)
    }

    /// Quotas and formation must describe a squad that can field a lineup:
    /// starters plus bench fill the squad, one keeper starts, one waits on
    /// the bench and the minimum outfield counts fit the quotas.
    pub fn validate(&self) -> Result<(), ModelError> {
        let quotas = &self.quotas;
        let formation = &self.formation;
        let size = [quotas.keepers, quotas.defenders, quotas.midfielders, quotas.forwards]
            .iter()
            .map(|n| usize::from(*n))
            .sum::<usize>();
        if size > usize::from(u8::MAX) {
            return Err(ModelError::invalid_rules(format!("squad of {size} players")));
        }
        if formation.starters == 0 || formation.keepers == 0 {
            return Err(ModelError::invalid_rules("a lineup needs a starting keeper"));
        }
        if usize::from(formation.starters) + usize::from(formation.bench) != size {
            return Err(ModelError::invalid_rules(format!(
                "{} starters and {} reserves do not make a squad of {size}",
                formation.starters, formation.bench
            )));
        }
        if usize::from(quotas.keepers) != usize::from(formation.keepers) + 1 {
            return Err(ModelError::invalid_rules(format!(
                "{} keepers cannot fill {} starting slots and one reserve slot",
                quotas.keepers, formation.keepers
            )));
        }
        let outfield_minimum = usize::from(formation.keepers)
            + usize::from(formation.min_defenders)
            + usize::from(formation.min_forwards);
        if formation.min_defenders > quotas.defenders
            || formation.min_forwards > quotas.forwards
            || outfield_minimum > usize::from(formation.starters)
        {
            return Err(ModelError::invalid_rules("formation minimums exceed the quotas"));
        }
        if self.max_per_team == 0 {
            return Err(ModelError::invalid_rules("max_per_team must be positive"));
        }
        if self.budget_cap.is_negative() {
            return Err(ModelError::invalid_rules("budget_cap must not be negative"));
        }
        Ok(())
    }
}
