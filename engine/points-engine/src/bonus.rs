//! Bonus point allocation from the per-match bonus-point score

use serde::{Deserialize, Serialize};
use squad_model::PlayerId;

/// Bonus awarded to one player in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusAward {
    pub player_id: PlayerId,
    pub bps: i32,
    pub bonus: u8,
}

/// Award 3/2/1 bonus points to the top of one match's bonus-point ranking.
///
/// Ties are resolved per rank:
/// - tied for 1st: every tied player gets 3, the next distinct score gets 1
///   and nobody gets 2
/// - tied for 2nd: every tied player gets 2, 1st keeps 3, nobody gets 1
/// - tied for 3rd: every tied player gets 1
///
/// Only awarded players are returned, ordered by score then identity.
pub fn allocate_bonus(scores: &[(PlayerId, i32)]) -> Vec<BonusAward> {
    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut groups: Vec<&[(PlayerId, i32)]> = Vec::new();
    let mut start = 0;
    for i in 1..=ranked.len() {
        if i == ranked.len() || ranked[i].1 != ranked[start].1 {
            groups.push(&ranked[start..i]);
            start = i;
        }
    }

    let mut awards = Vec::new();
    let Some(first) = groups.first() else {
        return awards;
    };
    award(&mut awards, first, 3);
    if first.len() > 1 {
        if let Some(next) = groups.get(1) {
            award(&mut awards, next, 1);
        }
        return awards;
    }

    let Some(second) = groups.get(1) else {
        return awards;
    };
    award(&mut awards, second, 2);
    if second.len() > 1 {
        return awards;
    }

    if let Some(third) = groups.get(2) {
        award(&mut awards, third, 1);
    }
    awards
}

fn award(awards: &mut Vec<BonusAward>, group: &[(PlayerId, i32)], bonus: u8) {
    awards.extend(group.iter().map(|(player_id, bps)| BonusAward {
        player_id: *player_id,
        bps: *bps,
        bonus,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bonus_of(awards: &[BonusAward], id: u32) -> u8 {
        awards.iter().find(|a| a.player_id == PlayerId(id)).map_or(0, |a| a.bonus)
    }

    #[test]
    fn test_no_ties() {
        let awards = allocate_bonus(&[
            (PlayerId(1), 30),
            (PlayerId(2), 25),
            (PlayerId(3), 20),
            (PlayerId(4), 10),
        ]);
        assert_eq!(awards.len(), 3);
        assert_eq!(bonus_of(&awards, 1), 3);
        assert_eq!(bonus_of(&awards, 2), 2);
        assert_eq!(bonus_of(&awards, 3), 1);
        assert_eq!(bonus_of(&awards, 4), 0);
    }

    #[test]
    fn test_three_way_tie_for_first_skips_second() {
        let awards = allocate_bonus(&[
            (PlayerId(1), 30),
            (PlayerId(2), 30),
            (PlayerId(3), 30),
            (PlayerId(4), 20),
            (PlayerId(5), 10),
        ]);
        assert_eq!(bonus_of(&awards, 1), 3);
        assert_eq!(bonus_of(&awards, 2), 3);
        assert_eq!(bonus_of(&awards, 3), 3);
        assert_eq!(bonus_of(&awards, 4), 1);
        assert_eq!(bonus_of(&awards, 5), 0);
        assert!(awards.iter().all(|a| a.bonus != 2));
    }

    #[test]
    fn test_two_way_tie_for_first() {
        let awards =
            allocate_bonus(&[(PlayerId(1), 30), (PlayerId(2), 30), (PlayerId(3), 20), (PlayerId(4), 20)]);
        assert_eq!(bonus_of(&awards, 1), 3);
        assert_eq!(bonus_of(&awards, 2), 3);
        assert_eq!(bonus_of(&awards, 3), 1);
        assert_eq!(bonus_of(&awards, 4), 1);
    }

    #[test]
    fn test_tie_for_second() {
        let awards =
            allocate_bonus(&[(PlayerId(1), 40), (PlayerId(2), 30), (PlayerId(3), 30), (PlayerId(4), 20)]);
        assert_eq!(bonus_of(&awards, 1), 3);
        assert_eq!(bonus_of(&awards, 2), 2);
        assert_eq!(bonus_of(&awards, 3), 2);
        assert_eq!(bonus_of(&awards, 4), 0);
    }

    #[test]
    fn test_tie_for_third() {
        let awards = allocate_bonus(&[
            (PlayerId(5), 15),
            (PlayerId(1), 40),
            (PlayerId(2), 30),
            (PlayerId(3), 15),
            (PlayerId(4), 15),
        ]);
        assert_eq!(bonus_of(&awards, 3), 1);
        assert_eq!(bonus_of(&awards, 4), 1);
        assert_eq!(bonus_of(&awards, 5), 1);
        assert_eq!(awards.len(), 5);
        assert_eq!(awards[0].player_id, PlayerId(1));
    }

    #[test]
    fn test_empty_and_single() {
        assert!(allocate_bonus(&[]).is_empty());
        let awards = allocate_bonus(&[(PlayerId(9), -3)]);
        assert_eq!(awards, vec![BonusAward { player_id: PlayerId(9), bps: -3, bonus: 3 }]);
    }
}
