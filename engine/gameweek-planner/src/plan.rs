use crate::error::PlanError;
use chip_tracker::ChipTracker;
use serde::{Deserialize, Serialize};
use squad_model::{ChipKind, Gameweek, Lineup, PlayerId, Squad, Transfer};
use squad_optimizer::SwapMove;
use transfer_ledger::TransferLedger;

/// Everything that carries over from one gameweek to the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanState {
    pub squad: Squad,
    pub ledger: TransferLedger,
    pub chips: ChipTracker,
}

/// What to do ahead of one gameweek deadline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanAction {
    /// Keep the squad, optionally playing Bench Boost or Triple Captain
    Hold { chip: Option<ChipKind> },
    /// Make the swap, optionally playing Bench Boost or Triple Captain
    Swap { swap: SwapMove, chip: Option<ChipKind> },
    /// Rebuild the squad with a Wildcard or Free Hit
    Rebuild { chip: ChipKind },
}

impl PlanAction {
    pub fn chip(&self) -> Option<ChipKind> {
        match self {
            PlanAction::Hold { chip } | PlanAction::Swap { chip, .. } => *chip,
            PlanAction::Rebuild { chip } => Some(*chip),
        }
    }
}

/// One gameweek of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameweekPlanStep {
    pub gameweek: Gameweek,
    /// Squad fielded in this gameweek
    pub squad: Squad,
    pub lineup: Lineup,
    pub transfers: Vec<Transfer>,
    pub chip: Option<ChipKind>,
    pub captain: PlayerId,
    pub vice_captain: PlayerId,
    /// Free transfers banked before this gameweek's transfers
    pub free_transfers: u8,
    pub hit_points: u32,
    pub projected_points: f64,
    pub net_points: f64,
}

/// Ordered steps with totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub steps: Vec<GameweekPlanStep>,
    pub projected_points: f64,
    pub hit_points: u32,
    pub net_points: f64,
    /// The search stopped on its expansion or time limit; `steps` may be
    /// shorter than the requested horizon
    pub truncated: bool,
    pub expansions: usize,
}

impl TransferPlan {
    pub(crate) fn from_steps(steps: Vec<GameweekPlanStep>, truncated: bool, expansions: usize) -> Self {
        let projected_points = steps.iter().map(|s| s.projected_points).sum();
        let hit_points = steps.iter().map(|s| s.hit_points).sum();
        let net_points = steps.iter().map(|s| s.net_points).sum();
        Self { steps, projected_points, hit_points, net_points, truncated, expansions }
    }

    pub fn to_json(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Chips played in the plan, in order
    pub fn chips(&self) -> Vec<(Gameweek, ChipKind)> {
        self.steps.iter().filter_map(|s| s.chip.map(|c| (s.gameweek, c))).collect()
    }
}
