//! Swap neighbourhoods and steepest-ascent local search

use crate::config::OptimizerConfig;
use crate::error::OptimizeError;
use crate::lineup::{rank_cmp, Objective, PlayerEntry, ValueTable};
use serde::{Deserialize, Serialize};
use squad_model::{
    PlayerCatalogue, PlayerId, Position, Price, Squad, SquadMember, SquadRules, TeamId,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use transfer_ledger::TransferLedger;

/// Players sold and bought together. Both lists are sorted by id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SwapMove {
    pub out: Vec<PlayerId>,
    pub incoming: Vec<PlayerId>,
}

impl SwapMove {
    pub fn single(out: PlayerId, incoming: PlayerId) -> Self {
        Self { out: vec![out], incoming: vec![incoming] }
    }

    pub fn pair(out: [PlayerId; 2], incoming: [PlayerId; 2]) -> Self {
        let mut out = out.to_vec();
        let mut incoming = incoming.to_vec();
        out.sort();
        incoming.sort();
        Self { out, incoming }
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// The squad after this swap, or `None` if it cannot be afforded
    pub fn apply(
        &self,
        catalogue: &PlayerCatalogue,
        squad: &Squad,
    ) -> Result<Option<Squad>, OptimizeError> {
        if self.out.len() != self.incoming.len() {
            return Err(OptimizeError::contract("swap sells and buys different numbers of players"));
        }
        if let Some(id) = self.out.iter().find(|id| !squad.contains(**id)) {
            return Err(OptimizeError::contract(format!("player {id} is not in the squad")));
        }
        if let Some(id) = self.incoming.iter().find(|id| squad.contains(**id)) {
            return Err(OptimizeError::contract(format!("player {id} is already in the squad")));
        }
        apply_swap(catalogue, squad, &self.out, &self.incoming)
    }
}

/// A swap with its objective gain and the hit it would cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMove {
    pub swap: SwapMove,
    /// Objective change before transfer costs
    pub gain: f64,
    /// Additional hit points the swap incurs
    pub hit_points: u32,
    /// `gain` minus the marginal hit cost
    pub net_gain: f64,
}

/// Best move first: higher net gain, then fewer transfers, then signature
pub(crate) fn move_cmp(a: &ScoredMove, b: &ScoredMove) -> Ordering {
    b.net_gain
        .total_cmp(&a.net_gain)
        .then(a.swap.len().cmp(&b.swap.len()))
        .then_with(|| a.swap.cmp(&b.swap))
}

/// Sell `out` and buy `incoming` at current prices in one step.
///
/// Returns `None` when the bank would go negative.
pub(crate) fn apply_swap(
    catalogue: &PlayerCatalogue,
    squad: &Squad,
    out: &[PlayerId],
    incoming: &[PlayerId],
) -> Result<Option<Squad>, OptimizeError> {
    let mut bank = squad.bank();
    for id in out {
        bank += squad.selling_price(catalogue, *id)?;
    }
    let mut members: Vec<SquadMember> =
        squad.members().iter().filter(|m| !out.contains(&m.player_id)).copied().collect();
    for id in incoming {
        let price = catalogue.player(*id)?.price;
        bank -= price;
        members.push(SquadMember { player_id: *id, purchase_price: price });
    }
    if bank.is_negative() {
        return Ok(None);
    }
    Ok(Some(Squad::new(members, bank)))
}

/// Everything the search needs that does not change between moves
pub(crate) struct SearchContext<'a> {
    pub catalogue: &'a PlayerCatalogue,
    pub table: &'a ValueTable,
    pub rules: &'a SquadRules,
    pub config: &'a OptimizerConfig,
    pub objective: &'a Objective,
    pub locked: &'a BTreeSet<PlayerId>,
    /// Squad transfers are counted against, if hits apply
    pub baseline: Option<&'a Squad>,
    pub ledger: Option<&'a TransferLedger>,
    pub indices: Vec<usize>,
    pools: [Vec<PlayerId>; 4],
    pair_pools: [Vec<PlayerId>; 4],
}

/// Outcome of one local search run
#[derive(Debug, Clone)]
pub(crate) struct Climb {
    pub squad: Squad,
    pub value: f64,
    pub iterations: usize,
}

impl<'a> SearchContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalogue: &'a PlayerCatalogue,
        table: &'a ValueTable,
        rules: &'a SquadRules,
        config: &'a OptimizerConfig,
        objective: &'a Objective,
        locked: &'a BTreeSet<PlayerId>,
        baseline: Option<&'a Squad>,
        ledger: Option<&'a TransferLedger>,
    ) -> Result<Self, OptimizeError> {
        let indices = objective.indices(table)?;
        let mut by_position: [Vec<(&PlayerEntry, f64)>; 4] = Default::default();
        for entry in table.entries() {
            by_position[entry.position.index()]
                .push((entry, table.window_value(entry.id, &indices)));
        }

        let mut pools: [Vec<PlayerId>; 4] = Default::default();
        let mut pair_pools: [Vec<PlayerId>; 4] = Default::default();
        for (i, group) in by_position.iter_mut().enumerate() {
            group.sort_by(|a, b| rank_cmp(a.0, a.1, b.0, b.1));
            let mut pool: Vec<PlayerId> =
                group.iter().take(config.candidate_pool).map(|(e, _)| e.id).collect();
            pair_pools[i] = pool.iter().take(config.pair_pool).copied().collect();

            let mut by_ratio = group.clone();
            by_ratio.sort_by(|a, b| {
                ratio(b.0, b.1).total_cmp(&ratio(a.0, a.1)).then(rank_cmp(a.0, a.1, b.0, b.1))
            });
            for (entry, _) in by_ratio.iter().take(config.budget_pool) {
                if !pool.contains(&entry.id) {
                    pool.push(entry.id);
                }
            }
            pools[i] = pool;
        }

        Ok(Self {
            catalogue,
            table,
            rules,
            config,
            objective,
            locked,
            baseline,
            ledger,
            indices,
            pools,
            pair_pools,
        })
    }

    pub fn evaluate(&self, squad: &Squad) -> Result<f64, OptimizeError> {
        let ids: Vec<PlayerId> = squad.player_ids().collect();
        self.objective.evaluate(self.table, &self.indices, &ids, &self.rules.formation)
    }

    /// Transfers made relative to the baseline squad
    pub fn transfer_count(&self, squad: &Squad) -> usize {
        self.baseline.map_or(0, |base| squad.difference(base).len())
    }

    /// Hit points owed for the transfers in `squad`
    pub fn hit_points(&self, squad: &Squad) -> u32 {
        match self.ledger {
            Some(ledger) if self.baseline.is_some() => {
                let count = u8::try_from(self.transfer_count(squad)).unwrap_or(u8::MAX);
                ledger.quote(count).hit_points
            }
            _ => 0,
        }
    }

    fn team_counts(&self, squad: &Squad) -> Result<BTreeMap<TeamId, u8>, OptimizeError> {
        let mut counts = BTreeMap::new();
        for id in squad.player_ids() {
            *counts.entry(self.table.entry(id)?.team).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn club_allows(
        &self,
        counts: &BTreeMap<TeamId, u8>,
        out: &[&PlayerEntry],
        incoming: &[&PlayerEntry],
    ) -> bool {
        let mut next = counts.clone();
        for entry in out {
            if let Some(n) = next.get_mut(&entry.team) {
                *n = n.saturating_sub(1);
            }
        }
        for entry in incoming {
            let n = next.entry(entry.team).or_insert(0);
            *n += 1;
            if *n > self.rules.max_per_team {
                return false;
            }
        }
        true
    }

    fn score(
        &self,
        squad: &Squad,
        value: f64,
        hits: u32,
        swap: SwapMove,
    ) -> Result<Option<(ScoredMove, Squad)>, OptimizeError> {
        let Some(next) = apply_swap(self.catalogue, squad, &swap.out, &swap.incoming)? else {
            return Ok(None);
        };
        let gain = self.evaluate(&next)? - value;
        let next_hits = self.hit_points(&next);
        let marginal = f64::from(next_hits) - f64::from(hits);
        let scored = ScoredMove {
            swap,
            gain,
            hit_points: next_hits.saturating_sub(hits),
            net_gain: gain - marginal,
        };
        Ok(Some((scored, next)))
    }

    fn sellable(&self, squad: &Squad) -> Result<Vec<&'a PlayerEntry>, OptimizeError> {
        squad
            .player_ids()
            .filter(|id| !self.locked.contains(id))
            .map(|id| self.table.entry(id))
            .collect()
    }

    /// Every affordable single swap within the candidate pools
    pub fn single_moves(
        &self,
        squad: &Squad,
        value: f64,
    ) -> Result<Vec<(ScoredMove, Squad)>, OptimizeError> {
        let hits = self.hit_points(squad);
        let counts = self.team_counts(squad)?;
        let mut moves = Vec::new();
        for out in self.sellable(squad)? {
            for id in &self.pools[out.position.index()] {
                if squad.contains(*id) {
                    continue;
                }
                let incoming = self.table.entry(*id)?;
                if !self.club_allows(&counts, &[out], &[incoming]) {
                    continue;
                }
                if let Some(scored) =
                    self.score(squad, value, hits, SwapMove::single(out.id, incoming.id))?
                {
                    moves.push(scored);
                }
            }
        }
        Ok(moves)
    }

    /// Two-for-two swaps drawn from the smaller pair pools
    pub fn pair_moves(
        &self,
        squad: &Squad,
        value: f64,
    ) -> Result<Vec<(ScoredMove, Squad)>, OptimizeError> {
        let hits = self.hit_points(squad);
        let counts = self.team_counts(squad)?;
        let sellable = self.sellable(squad)?;
        let mut moves = Vec::new();
        for (i, first_out) in sellable.iter().enumerate() {
            for second_out in &sellable[i + 1..] {
                let first_pool = &self.pair_pools[first_out.position.index()];
                let second_pool = &self.pair_pools[second_out.position.index()];
                for a in first_pool {
                    for b in second_pool {
                        if a == b || squad.contains(*a) || squad.contains(*b) {
                            continue;
                        }
                        if first_out.position == second_out.position && a > b {
                            continue;
                        }
                        let incoming = [self.table.entry(*a)?, self.table.entry(*b)?];
                        if !self.club_allows(&counts, &[*first_out, *second_out], &incoming) {
                            continue;
                        }
                        let swap = SwapMove::pair([first_out.id, second_out.id], [*a, *b]);
                        if let Some(scored) = self.score(squad, value, hits, swap)? {
                            moves.push(scored);
                        }
                    }
                }
            }
        }
        Ok(moves)
    }

    /// Steepest ascent from `seed` until no move beats `min_gain`
    pub fn climb(&self, seed: Squad) -> Result<Climb, OptimizeError> {
        let mut squad = seed;
        let mut value = self.evaluate(&squad)?;
        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            let mut best = best_move(self.single_moves(&squad, value)?);
            let improves = |m: &Option<(ScoredMove, Squad)>| {
                m.as_ref().is_some_and(|(s, _)| s.net_gain > self.config.min_gain)
            };
            if !improves(&best) && self.config.pair_swaps {
                best = best_move(self.pair_moves(&squad, value)?);
            }
            if !improves(&best) {
                break;
            }
            let Some((scored, next)) = best else {
                break;
            };
            debug!(
                out = ?scored.swap.out,
                incoming = ?scored.swap.incoming,
                net_gain = scored.net_gain,
                "accepted swap"
            );
            value += scored.gain;
            squad = next;
            iterations += 1;
        }
        Ok(Climb { squad, value, iterations })
    }
}

fn best_move(moves: Vec<(ScoredMove, Squad)>) -> Option<(ScoredMove, Squad)> {
    moves.into_iter().min_by(|a, b| move_cmp(&a.0, &b.0))
}

fn ratio(entry: &PlayerEntry, value: f64) -> f64 {
    let price = entry.price.to_units();
    if price > 0.0 {
        value / price
    } else {
        value
    }
}

/// Effective cost of a player when rebuilding from `current`: the selling
/// price for players already owned, the catalogue price otherwise.
pub(crate) fn effective_prices(
    catalogue: &PlayerCatalogue,
    current: Option<&Squad>,
) -> Result<BTreeMap<PlayerId, Price>, OptimizeError> {
    let mut prices = BTreeMap::new();
    if let Some(squad) = current {
        for id in squad.player_ids() {
            prices.insert(id, squad.selling_price(catalogue, id)?);
        }
    }
    Ok(prices)
}

pub(crate) fn price_of(entry: &PlayerEntry, overrides: &BTreeMap<PlayerId, Price>) -> Price {
    overrides.get(&entry.id).copied().unwrap_or(entry.price)
}

/// Position slots still open after the locked players
pub(crate) fn open_slots(
    table: &ValueTable,
    rules: &SquadRules,
    picked: &[PlayerId],
) -> Result<[u8; 4], OptimizeError> {
    let mut open = [0u8; 4];
    for position in Position::ALL {
        open[position.index()] = rules.quotas.get(position);
    }
    for id in picked {
        let slot = &mut open[table.entry(*id)?.position.index()];
        *slot = slot.saturating_sub(1);
    }
    Ok(open)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(net_gain: f64, out: &[u32], incoming: &[u32]) -> ScoredMove {
        ScoredMove {
            swap: SwapMove {
                out: out.iter().map(|id| PlayerId(*id)).collect(),
                incoming: incoming.iter().map(|id| PlayerId(*id)).collect(),
            },
            gain: net_gain,
            hit_points: 0,
            net_gain,
        }
    }

    #[test]
    fn test_move_order_prefers_gain_then_fewer_transfers() {
        let mut moves = vec![
            scored(2.0, &[1, 2], &[10, 11]),
            scored(2.0, &[3], &[12]),
            scored(3.0, &[4], &[13]),
            scored(2.0, &[1], &[12]),
        ];
        moves.sort_by(move_cmp);
        assert_eq!(moves[0].swap.out, vec![PlayerId(4)]);
        assert_eq!(moves[1].swap.out, vec![PlayerId(1)]);
        assert_eq!(moves[2].swap.out, vec![PlayerId(3)]);
        assert_eq!(moves[3].swap.len(), 2);
    }

    #[test]
    fn test_pair_signature_is_sorted() {
        let swap = SwapMove::pair([PlayerId(9), PlayerId(2)], [PlayerId(7), PlayerId(5)]);
        assert_eq!(swap.out, vec![PlayerId(2), PlayerId(9)]);
        assert_eq!(swap.incoming, vec![PlayerId(5), PlayerId(7)]);
    }
}
