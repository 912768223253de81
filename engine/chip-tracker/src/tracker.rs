use crate::error::ChipError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use squad_model::{ChipKind, Gameweek, SeasonCalendar, SeasonHalf};
use tracing::info;

/// Lifecycle state of one chip instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChipState {
    Available,
    /// Activated for a gameweek whose deadline has not passed yet
    Pending { gameweek: Gameweek },
    /// Terminal
    Used { gameweek: Gameweek },
}

impl ChipState {
    /// Gameweek the instance is committed to, pending or used
    pub fn gameweek(self) -> Option<Gameweek> {
        match self {
            ChipState::Available => None,
            ChipState::Pending { gameweek } | ChipState::Used { gameweek } => Some(gameweek),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipInstance {
    pub kind: ChipKind,
    pub half: SeasonHalf,
    pub state: ChipState,
}

/// Transition log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChipEvent {
    Activated { kind: ChipKind, half: SeasonHalf, gameweek: Gameweek },
    Cancelled { kind: ChipKind, half: SeasonHalf, gameweek: Gameweek },
    Confirmed { kind: ChipKind, half: SeasonHalf, gameweek: Gameweek },
}

/// Chip inventory: four kinds, one instance per season half
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrackerRecord")]
pub struct ChipTracker {
    calendar: SeasonCalendar,
    instances: Vec<ChipInstance>,
    history: Vec<ChipEvent>,
}

#[derive(Deserialize)]
struct TrackerRecord {
    calendar: SeasonCalendar,
    instances: Vec<ChipInstance>,
    #[serde(default)]
    history: Vec<ChipEvent>,
}

impl TryFrom<TrackerRecord> for ChipTracker {
    type Error = ChipError;

    /// Stored state must hold exactly one instance per kind and half
    fn try_from(record: TrackerRecord) -> Result<Self, ChipError> {
        for kind in ChipKind::ALL {
            for half in SeasonHalf::ALL {
                let count =
                    record.instances.iter().filter(|i| i.kind == kind && i.half == half).count();
                if count != 1 {
                    return Err(ChipError::MalformedState { kind, half, count });
                }
            }
        }
        Ok(Self { calendar: record.calendar, instances: record.instances, history: record.history })
    }
}

impl ChipTracker {
    /// Create a tracker with every instance available
    pub fn new(calendar: SeasonCalendar) -> Self {
        let instances = ChipKind::ALL
            .iter()
            .flat_map(|kind| {
                SeasonHalf::ALL.iter().map(move |half| ChipInstance {
                    kind: *kind,
                    half: *half,
                    state: ChipState::Available,
                })
            })
            .collect();
        Self { calendar, instances, history: Vec::new() }
    }

    pub fn calendar(&self) -> &SeasonCalendar {
        &self.calendar
    }

    pub fn instances(&self) -> &[ChipInstance] {
        &self.instances
    }

    pub fn history(&self) -> &[ChipEvent] {
        &self.history
    }

    pub fn state(&self, kind: ChipKind, half: SeasonHalf) -> ChipState {
        self.instances
            .iter()
            .find(|i| i.kind == kind && i.half == half)
            .map_or(ChipState::Available, |i| i.state)
    }

    fn instance_mut(
        &mut self,
        kind: ChipKind,
        half: SeasonHalf,
    ) -> Result<&mut ChipInstance, ChipError> {
        self.instances
            .iter_mut()
            .find(|i| i.kind == kind && i.half == half)
            .ok_or(ChipError::MalformedState { kind, half, count: 0 })
    }

    /// Chip committed (pending or used) to a gameweek
    pub fn chip_for_gameweek(&self, gameweek: Gameweek) -> Option<ChipKind> {
        self.instances.iter().find(|i| i.state.gameweek() == Some(gameweek)).map(|i| i.kind)
    }

    fn free_hit_in(&self, gameweek: Gameweek) -> bool {
        self.chip_for_gameweek(gameweek) == Some(ChipKind::FreeHit)
    }

    /// Check every guard of `activate` without changing state
    pub fn can_activate(&self, kind: ChipKind, gameweek: Gameweek) -> Result<(), ChipError> {
        if !self.calendar.contains(gameweek) {
            return Err(ChipError::OutsideSeason { gameweek });
        }
        let half = self.calendar.half_of(gameweek);
        if self.state(kind, half) != ChipState::Available {
            return Err(ChipError::NotAvailable { kind, half });
        }
        if let Some(chip) = self.chip_for_gameweek(gameweek) {
            return Err(ChipError::GameweekAlreadyHasChip { gameweek, chip });
        }
        if kind == ChipKind::FreeHit && gameweek > 1 && self.free_hit_in(gameweek - 1) {
            return Err(ChipError::ConsecutiveFreeHit { gameweek });
        }
        Ok(())
    }

    /// Chips that could be activated for a gameweek
    pub fn available_chips(&self, gameweek: Gameweek) -> Vec<ChipKind> {
        ChipKind::ALL.into_iter().filter(|k| self.can_activate(*k, gameweek).is_ok()).collect()
    }

    /// Activate the instance belonging to the gameweek's season half
    pub fn activate(&mut self, kind: ChipKind, gameweek: Gameweek) -> Result<(), ChipError> {
        self.can_activate(kind, gameweek)?;
        let half = self.calendar.half_of(gameweek);
        self.instance_mut(kind, half)?.state = ChipState::Pending { gameweek };
        self.history.push(ChipEvent::Activated { kind, half, gameweek });
        info!(%kind, gameweek, "chip activated");
        Ok(())
    }

    /// Cancel a pending activation before the gameweek deadline
    pub fn cancel(
        &mut self,
        kind: ChipKind,
        gameweek: Gameweek,
        now: DateTime<Utc>,
    ) -> Result<(), ChipError> {
        let half = self.calendar.half_of(gameweek);
        if self.state(kind, half) != (ChipState::Pending { gameweek }) {
            return Err(ChipError::NotPending { kind, gameweek });
        }
        if !self.calendar.is_before_deadline(gameweek, now) {
            return Err(ChipError::DeadlinePassed { gameweek });
        }
        self.instance_mut(kind, half)?.state = ChipState::Available;
        self.history.push(ChipEvent::Cancelled { kind, half, gameweek });
        info!(%kind, gameweek, "chip cancelled");
        Ok(())
    }

    /// The gameweek deadline passed: pending activations become used
    pub fn confirm_gameweek(&mut self, gameweek: Gameweek) -> Option<ChipKind> {
        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.state == ChipState::Pending { gameweek })?;
        instance.state = ChipState::Used { gameweek };
        let (kind, half) = (instance.kind, instance.half);
        self.history.push(ChipEvent::Confirmed { kind, half, gameweek });
        Some(kind)
    }

    /// Activate and immediately confirm, for simulated future gameweeks
    pub fn commit(&mut self, kind: ChipKind, gameweek: Gameweek) -> Result<(), ChipError> {
        self.activate(kind, gameweek)?;
        self.confirm_gameweek(gameweek);
        Ok(())
    }

    /// Number of instances still available
    pub fn remaining(&self) -> usize {
        self.instances.iter().filter(|i| i.state == ChipState::Available).count()
    }
}
