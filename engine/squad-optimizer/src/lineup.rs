//! Starting eleven selection and the projected-points objective

use crate::error::OptimizeError;
use squad_model::{
    ChipKind, FormationRules, Gameweek, Lineup, PlayerCatalogue, PlayerId, Position, Price, Squad,
    TeamId,
};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Static facts about a player needed during search
#[derive(Debug, Clone)]
pub(crate) struct PlayerEntry {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: TeamId,
    pub price: Price,
}

/// Expected points of every catalogue player for a fixed set of gameweeks.
///
/// Built once per request so the search never touches projections maps.
#[derive(Debug, Clone)]
pub struct ValueTable {
    gameweeks: Vec<Gameweek>,
    entries: HashMap<PlayerId, (PlayerEntry, Vec<f64>)>,
}

impl ValueTable {
    pub fn build(catalogue: &PlayerCatalogue, gameweeks: &[Gameweek]) -> Self {
        let entries = catalogue
            .iter()
            .map(|p| {
                let entry = PlayerEntry {
                    id: p.id,
                    name: p.name.clone(),
                    position: p.position,
                    team: p.team,
                    price: p.price,
                };
                let values = gameweeks.iter().map(|gw| p.expected_points(*gw)).collect();
                (p.id, (entry, values))
            })
            .collect();
        Self { gameweeks: gameweeks.to_vec(), entries }
    }

    pub fn gameweeks(&self) -> &[Gameweek] {
        &self.gameweeks
    }

    pub(crate) fn gameweek_index(&self, gameweek: Gameweek) -> Result<usize, OptimizeError> {
        self.gameweeks.iter().position(|gw| *gw == gameweek).ok_or_else(|| {
            OptimizeError::contract(format!("no projections loaded for gameweek {gameweek}"))
        })
    }

    pub(crate) fn entry(&self, id: PlayerId) -> Result<&PlayerEntry, OptimizeError> {
        self.entries
            .get(&id)
            .map(|(entry, _)| entry)
            .ok_or_else(|| OptimizeError::contract(format!("unknown player {id}")))
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &PlayerEntry> {
        self.entries.values().map(|(entry, _)| entry)
    }

    /// Expected points of a player in the gameweek at `gw_idx`
    pub(crate) fn value(&self, id: PlayerId, gw_idx: usize) -> f64 {
        self.entries.get(&id).and_then(|(_, v)| v.get(gw_idx)).copied().unwrap_or(0.0)
    }

    /// Expected points summed over the given gameweek indices
    pub(crate) fn window_value(&self, id: PlayerId, gw_indices: &[usize]) -> f64 {
        gw_indices.iter().map(|i| self.value(id, *i)).sum()
    }
}

/// Ranking used for every selection tie: higher value first, then lower
/// price, then name, then identity.
pub(crate) fn rank_cmp(a: &PlayerEntry, a_value: f64, b: &PlayerEntry, b_value: f64) -> Ordering {
    b_value
        .total_cmp(&a_value)
        .then(a.price.cmp(&b.price))
        .then(a.name.cmp(&b.name))
        .then(a.id.cmp(&b.id))
}

/// Best lineup for one gameweek, ids only
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LineupPick {
    pub starters: Vec<PlayerId>,
    pub bench: Vec<PlayerId>,
    pub captain: PlayerId,
    pub vice_captain: PlayerId,
    pub points: f64,
}

/// Choose the highest-scoring valid eleven from a squad.
///
/// The keeper slot and the formation minimums are filled first with the
/// best players of those positions; the remaining outfield slots go to the
/// best of the rest. Squad quotas cap the other positions, so this greedy
/// fill is optimal.
pub(crate) fn pick_lineup(
    table: &ValueTable,
    squad: &[PlayerId],
    gw_idx: usize,
    chip: Option<ChipKind>,
    formation: &FormationRules,
) -> Result<LineupPick, OptimizeError> {
    let mut by_position: [Vec<(&PlayerEntry, f64)>; 4] = Default::default();
    for id in squad {
        let entry = table.entry(*id)?;
        by_position[entry.position.index()].push((entry, table.value(*id, gw_idx)));
    }
    for group in by_position.iter_mut() {
        group.sort_by(|a, b| rank_cmp(a.0, a.1, b.0, b.1));
    }

    let mut starters: Vec<(&PlayerEntry, f64)> = Vec::with_capacity(formation.starters as usize);
    let mut keepers_bench = Vec::new();
    let mut rest = Vec::new();
    for (position, group) in Position::ALL.iter().zip(by_position.iter()) {
        let forced = match position {
            Position::Keeper => formation.keepers,
            Position::Defender => formation.min_defenders,
            Position::Midfielder => 0,
            Position::Forward => formation.min_forwards,
        } as usize;
        if group.len() < forced {
            return Err(OptimizeError::contract(format!(
                "squad has {} {position} players, formation needs {forced}",
                group.len()
            )));
        }
        starters.extend_from_slice(&group[..forced]);
        if *position == Position::Keeper {
            keepers_bench.extend_from_slice(&group[forced..]);
        } else {
            rest.extend_from_slice(&group[forced..]);
        }
    }

    rest.sort_by(|a, b| rank_cmp(a.0, a.1, b.0, b.1));
    let open = (formation.starters as usize).saturating_sub(starters.len());
    if rest.len() < open {
        return Err(OptimizeError::contract("squad too small for a starting eleven"));
    }
    starters.extend_from_slice(&rest[..open]);
    let outfield_bench = &rest[open..];

    let mut by_rank = starters.clone();
    by_rank.sort_by(|a, b| rank_cmp(a.0, a.1, b.0, b.1));
    let captain = by_rank
        .first()
        .copied()
        .ok_or_else(|| OptimizeError::contract("formation has no starters"))?;
    let vice_captain = by_rank.get(1).copied().unwrap_or(captain);

    let bench: Vec<(&PlayerEntry, f64)> =
        keepers_bench.iter().chain(outfield_bench.iter()).copied().collect();

    let mut points: f64 = starters.iter().map(|(_, v)| v).sum();
    points += captain.1 * f64::from(ChipKind::captain_multiplier(chip) - 1);
    if ChipKind::counts_bench(chip) {
        points += bench.iter().map(|(_, v)| v).sum::<f64>();
    }

    starters.sort_by_key(|(entry, _)| entry.position);
    Ok(LineupPick {
        starters: starters.iter().map(|(e, _)| e.id).collect(),
        bench: bench.iter().map(|(e, _)| e.id).collect(),
        captain: captain.0.id,
        vice_captain: vice_captain.0.id,
        points,
    })
}

/// What the optimizer maximises
///
/// The sum over `gameweeks` of each gameweek's best lineup points. `chip`
/// applies to the first gameweek only.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub gameweeks: Vec<Gameweek>,
    pub chip: Option<ChipKind>,
}

impl Objective {
    pub fn single(gameweek: Gameweek) -> Self {
        Self { gameweeks: vec![gameweek], chip: None }
    }

    pub fn window(first: Gameweek, length: u16) -> Self {
        Self { gameweeks: (first..first + length.max(1)).collect(), chip: None }
    }

    pub fn with_chip(mut self, chip: Option<ChipKind>) -> Self {
        self.chip = chip;
        self
    }

    pub(crate) fn indices(&self, table: &ValueTable) -> Result<Vec<usize>, OptimizeError> {
        if self.gameweeks.is_empty() {
            return Err(OptimizeError::contract("objective has no gameweeks"));
        }
        self.gameweeks.iter().map(|gw| table.gameweek_index(*gw)).collect()
    }

    pub(crate) fn evaluate(
        &self,
        table: &ValueTable,
        indices: &[usize],
        squad: &[PlayerId],
        formation: &FormationRules,
    ) -> Result<f64, OptimizeError> {
        let mut total = 0.0;
        for (n, gw_idx) in indices.iter().enumerate() {
            let chip = if n == 0 { self.chip } else { None };
            total += pick_lineup(table, squad, *gw_idx, chip, formation)?.points;
        }
        Ok(total)
    }
}

/// A lineup for one gameweek with its projected points
#[derive(Debug, Clone, PartialEq)]
pub struct LineupChoice {
    pub lineup: Lineup,
    pub projected_points: f64,
}

/// Pick the best starting eleven, bench order and armbands of a squad
pub fn select_lineup(
    catalogue: &PlayerCatalogue,
    squad: &Squad,
    gameweek: Gameweek,
    chip: Option<ChipKind>,
    formation: &FormationRules,
) -> Result<LineupChoice, OptimizeError> {
    let table = ValueTable::build(catalogue, &[gameweek]);
    let ids: Vec<PlayerId> = squad.player_ids().collect();
    lineup_choice(catalogue, &table, &ids, 0, chip, formation)
}

pub(crate) fn lineup_choice(
    catalogue: &PlayerCatalogue,
    table: &ValueTable,
    ids: &[PlayerId],
    gw_idx: usize,
    chip: Option<ChipKind>,
    formation: &FormationRules,
) -> Result<LineupChoice, OptimizeError> {
    let pick = pick_lineup(table, ids, gw_idx, chip, formation)?;
    let lineup =
        Lineup::from_ids(catalogue, &pick.starters, &pick.bench, pick.captain, pick.vice_captain)?;
    Ok(LineupChoice { lineup, projected_points: pick.points })
}
