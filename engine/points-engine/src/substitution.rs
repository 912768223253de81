//! Automatic substitutions for one finished gameweek

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use squad_model::{
    ChipKind, FormationRules, Gameweek, Lineup, LineupSlot, PlayerCatalogue, PlayerId, Position,
    PositionCounts,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Which players appeared (played minutes or received a card)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearances {
    appeared: BTreeSet<PlayerId>,
}

impl Appearances {
    pub fn from_ids<I: IntoIterator<Item = PlayerId>>(ids: I) -> Self {
        Self { appeared: ids.into_iter().collect() }
    }

    /// Read appearances from the finalised statistics in the catalogue
    pub fn from_catalogue(catalogue: &PlayerCatalogue, gameweek: Gameweek) -> Self {
        Self::from_ids(
            catalogue
                .iter()
                .filter(|p| p.stats(gameweek).is_some_and(|s| s.appeared()))
                .map(|p| p.id),
        )
    }

    pub fn appeared(&self, id: PlayerId) -> bool {
        self.appeared.contains(&id)
    }
}

/// One automatic substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub out: LineupSlot,
    pub incoming: LineupSlot,
}

/// The lineup that scores once substitutions and the armband are resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalLineup {
    pub starters: Vec<LineupSlot>,
    pub bench: Vec<LineupSlot>,
    pub substitutions: Vec<Substitution>,
    /// Player receiving the captain multiplier, if any appeared
    pub captain: Option<PlayerId>,
    /// The vice-captain inherited the armband
    pub vice_captain_promoted: bool,
}

impl FinalLineup {
    /// Gameweek total from per-player match points.
    ///
    /// Bench Boost counts all fifteen players, Triple Captain triples the
    /// armband holder instead of doubling.
    pub fn gameweek_points(&self, points: &BTreeMap<PlayerId, i32>, chip: Option<ChipKind>) -> i32 {
        let of = |id: PlayerId| points.get(&id).copied().unwrap_or(0);
        let mut total: i32 = self.starters.iter().map(|s| of(s.player_id)).sum();
        if ChipKind::counts_bench(chip) {
            total += self.bench.iter().map(|s| of(s.player_id)).sum::<i32>();
        }
        if let Some(captain) = self.captain {
            total += of(captain) * (ChipKind::captain_multiplier(chip) as i32 - 1);
        }
        total
    }
}

/// Resolves automatic substitutions under a set of formation rules
#[derive(Debug, Clone, Default)]
pub struct SubstitutionResolver {
    formation: FormationRules,
}

impl SubstitutionResolver {
    pub fn new(formation: FormationRules) -> Self {
        Self { formation }
    }

    /// Compute the final scoring lineup.
    ///
    /// A non-appearing starting keeper is replaced by the reserve keeper if
    /// the reserve appeared. Outfield reserves are then taken in bench order;
    /// each replaces the first non-appearing outfield starter whose removal
    /// keeps the formation valid, or is skipped when there is none.
    pub fn resolve(
        &self,
        lineup: &Lineup,
        appearances: &Appearances,
    ) -> Result<FinalLineup, ScoringError> {
        lineup.validate(&self.formation)?;

        let mut starters = lineup.starters.clone();
        let mut bench = lineup.bench.clone();
        let mut substitutions = Vec::new();

        if let Some(keeper_idx) = starters.iter().position(|s| s.position == Position::Keeper) {
            let starter = starters[keeper_idx];
            let reserve = bench[0];
            if !appearances.appeared(starter.player_id) && appearances.appeared(reserve.player_id) {
                starters[keeper_idx] = reserve;
                bench[0] = starter;
                substitutions.push(Substitution { out: starter, incoming: reserve });
            }
        }

        for bench_idx in 1..bench.len() {
            let reserve = bench[bench_idx];
            if !appearances.appeared(reserve.player_id) {
                continue;
            }
            let counts = PositionCounts::from_positions(starters.iter().map(|s| s.position));
            let target = starters.iter().position(|s| {
                s.position.is_outfield()
                    && !appearances.appeared(s.player_id)
                    && self.formation.allows_swap(&counts, s.position, reserve.position)
            });
            match target {
                Some(starter_idx) => {
                    let starter = starters[starter_idx];
                    starters[starter_idx] = reserve;
                    bench[bench_idx] = starter;
                    substitutions.push(Substitution { out: starter, incoming: reserve });
                }
                None => {
                    debug!(reserve = %reserve.player_id, "no formation-valid substitution, reserve skipped");
                }
            }
        }

        let (captain, vice_captain_promoted) = if appearances.appeared(lineup.captain) {
            (Some(lineup.captain), false)
        } else if appearances.appeared(lineup.vice_captain) {
            (Some(lineup.vice_captain), true)
        } else {
            (None, false)
        };

        Ok(FinalLineup { starters, bench, substitutions, captain, vice_captain_promoted })
    }
}

/// Resolve the final lineup under the default formation rules
pub fn resolve_final_lineup(
    lineup: &Lineup,
    appearances: &Appearances,
) -> Result<FinalLineup, ScoringError> {
    SubstitutionResolver::default().resolve(lineup, appearances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn slot(id: u32, position: Position) -> LineupSlot {
        LineupSlot { player_id: PlayerId(id), position }
    }

    /// 1-3-5-2 with bench GK, DEF, MID, FWD
    fn lineup_352() -> Lineup {
        use Position::*;
        Lineup {
            starters: vec![
                slot(1, Keeper),
                slot(2, Defender),
                slot(3, Defender),
                slot(4, Defender),
                slot(5, Midfielder),
                slot(6, Midfielder),
                slot(7, Midfielder),
                slot(8, Midfielder),
                slot(9, Midfielder),
                slot(10, Forward),
                slot(11, Forward),
            ],
            bench: vec![slot(12, Keeper), slot(13, Defender), slot(14, Midfielder), slot(15, Forward)],
            captain: PlayerId(10),
            vice_captain: PlayerId(5),
        }
    }

    fn all_except(missing: &[u32]) -> Appearances {
        Appearances::from_ids((1..=15).filter(|id| !missing.contains(id)).map(PlayerId))
    }

    fn ids(slots: &[LineupSlot]) -> Vec<u32> {
        slots.iter().map(|s| s.player_id.0).collect()
    }

    #[test]
    fn test_bench_keeper_replaces_absent_keeper() {
        let result = resolve_final_lineup(&lineup_352(), &all_except(&[1])).unwrap();
        assert_eq!(result.starters[0].player_id, PlayerId(12));
        assert_eq!(result.bench[0].player_id, PlayerId(1));
        assert_eq!(result.substitutions.len(), 1);
    }

    #[test]
    fn test_absent_reserve_keeper_leaves_starter() {
        let result = resolve_final_lineup(&lineup_352(), &all_except(&[1, 12])).unwrap();
        assert_eq!(result.starters[0].player_id, PlayerId(1));
        assert!(result.substitutions.is_empty());
    }

    #[test]
    fn test_outfield_reserves_in_bench_order() {
        // midfielder 6 and forward 11 absent
        let result = resolve_final_lineup(&lineup_352(), &all_except(&[6, 11])).unwrap();
        // first reserve (DEF 13) replaces MID 6, then MID 14 replaces FWD 11
        assert_eq!(ids(&result.starters), vec![1, 2, 3, 4, 5, 13, 7, 8, 9, 10, 14]);
        assert_eq!(ids(&result.bench), vec![12, 6, 11, 15]);
    }

    #[test]
    fn test_formation_blocks_swap_and_reserve_is_skipped() {
        // both forwards and the forward reserve miss out: DEF 13 may replace
        // forward 10 while 11 still fills the minimum, MID 14 may not replace 11
        let result = resolve_final_lineup(&lineup_352(), &all_except(&[10, 11, 15])).unwrap();
        assert_eq!(ids(&result.starters), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 13, 11]);
        assert_eq!(result.substitutions.len(), 1);
    }

    #[test]
    fn test_defender_minimum_enforced() {
        // defender 2 absent with only non-defender reserves playing
        let result = resolve_final_lineup(&lineup_352(), &all_except(&[2, 13])).unwrap();
        assert!(result.substitutions.is_empty());
        assert_eq!(result.starters[1].player_id, PlayerId(2));
    }

    #[test]
    fn test_vice_captain_takes_armband() {
        let result = resolve_final_lineup(&lineup_352(), &all_except(&[10])).unwrap();
        assert_eq!(result.captain, Some(PlayerId(5)));
        assert!(result.vice_captain_promoted);

        let result = resolve_final_lineup(&lineup_352(), &all_except(&[10, 5])).unwrap();
        assert_eq!(result.captain, None);
    }

    #[test]
    fn test_gameweek_points_with_chips() {
        let result = resolve_final_lineup(&lineup_352(), &all_except(&[])).unwrap();
        let points: BTreeMap<PlayerId, i32> = (1..=15).map(|id| (PlayerId(id), 2)).collect();
        let mut points = points;
        points.insert(PlayerId(10), 10);

        // 10 starters * 2 + 10 + captain bonus 10
        assert_eq!(result.gameweek_points(&points, None), 40);
        assert_eq!(result.gameweek_points(&points, Some(ChipKind::TripleCaptain)), 50);
        assert_eq!(result.gameweek_points(&points, Some(ChipKind::BenchBoost)), 48);
    }

    #[test]
    fn test_malformed_lineup_rejected() {
        let mut lineup = lineup_352();
        lineup.starters.pop();
        assert!(matches!(
            resolve_final_lineup(&lineup, &all_except(&[])),
            Err(ScoringError::Model(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_final_lineup_always_formation_valid(mask in proptest::collection::vec(any::<bool>(), 15)) {
            let appearances = Appearances::from_ids(
                (1..=15u32).filter(|id| mask[(*id - 1) as usize]).map(PlayerId),
            );
            let result = resolve_final_lineup(&lineup_352(), &appearances).unwrap();
            let counts = PositionCounts::from_positions(result.starters.iter().map(|s| s.position));
            prop_assert!(FormationRules::default().is_valid(&counts));
            prop_assert_eq!(result.starters.len() + result.bench.len(), 15);
            prop_assert!(result.substitutions.len() <= 4);
        }
    }
}
