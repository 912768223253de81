use crate::config::ScoringRules;
use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use squad_model::{Gameweek, MatchStats, Player, Position};
use tracing::debug;

/// Itemised points for one player in one match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsBreakdown {
    pub appearance: i32,
    pub goals: i32,
    pub assists: i32,
    pub clean_sheet: i32,
    pub saves: i32,
    pub penalties_saved: i32,
    pub penalties_missed: i32,
    pub defensive_contribution: i32,
    pub goals_conceded: i32,
    pub cards: i32,
    pub own_goals: i32,
    pub bonus: i32,
}

impl PointsBreakdown {
    pub fn total(&self) -> i32 {
        self.appearance
            + self.goals
            + self.assists
            + self.clean_sheet
            + self.saves
            + self.penalties_saved
            + self.penalties_missed
            + self.defensive_contribution
            + self.goals_conceded
            + self.cards
            + self.own_goals
            + self.bonus
    }
}

/// Stateless points calculator over a fixed rule table
#[derive(Debug, Clone, Default)]
pub struct ScoringCalculator {
    rules: ScoringRules,
}

impl ScoringCalculator {
    /// Create a new calculator
    pub fn new(rules: ScoringRules) -> Result<Self, ScoringError> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Points for one match, itemised by rule
    pub fn breakdown(
        &self,
        position: Position,
        stats: &MatchStats,
    ) -> Result<PointsBreakdown, ScoringError> {
        self.check_contract(stats)?;
        let rules = &self.rules;
        let mut points = PointsBreakdown::default();

        points.appearance = match stats.minutes {
            0 => 0,
            m if m >= rules.full_appearance_minutes => rules.full_appearance_points,
            _ => rules.short_appearance_points,
        };
        points.goals = i32::from(stats.goals_scored) * rules.goal_points.get(position);
        points.assists = i32::from(stats.assists) * rules.assist_points;

        // The clean-sheet flag already reflects only the player's time on the
        // pitch, so a player subbed off before a concession keeps it.
        if stats.clean_sheet && stats.minutes >= rules.full_appearance_minutes {
            points.clean_sheet = rules.clean_sheet_points.get(position);
        }

        if position == Position::Keeper {
            points.saves = i32::from(stats.saves / rules.saves_per_point);
        }
        points.penalties_saved = i32::from(stats.penalties_saved) * rules.penalty_save_points;
        points.penalties_missed = i32::from(stats.penalties_missed) * rules.penalty_miss_points;

        if let Some(threshold) = rules.defensive_contribution_threshold.get(position) {
            if stats.defensive_actions(position) >= threshold {
                points.defensive_contribution = rules.defensive_contribution_points;
            }
        }

        if matches!(position, Position::Keeper | Position::Defender) {
            points.goals_conceded = -i32::from(stats.goals_conceded / rules.goals_conceded_per_point);
        }

        points.cards = if stats.red_cards > 0 {
            rules.red_card_points
        } else {
            i32::from(stats.yellow_cards) * rules.yellow_card_points
        };
        points.own_goals = i32::from(stats.own_goals) * rules.own_goal_points;
        points.bonus = i32::from(stats.bonus);

        debug!(?position, total = points.total(), "scored match");
        Ok(points)
    }

    /// Total points for one match
    pub fn compute_match_points(
        &self,
        position: Position,
        stats: &MatchStats,
    ) -> Result<i32, ScoringError> {
        Ok(self.breakdown(position, stats)?.total())
    }

    /// Points a player scored in a finalised gameweek; 0 without statistics
    pub fn compute_player_points(
        &self,
        player: &Player,
        gameweek: Gameweek,
    ) -> Result<i32, ScoringError> {
        match player.stats(gameweek) {
            Some(stats) => self.compute_match_points(player.position, stats),
            None => Ok(0),
        }
    }

    fn check_contract(&self, stats: &MatchStats) -> Result<(), ScoringError> {
        if stats.minutes > self.rules.max_minutes {
            return Err(ScoringError::contract(format!("{} minutes in one match", stats.minutes)));
        }
        if stats.bonus > self.rules.max_bonus {
            return Err(ScoringError::contract(format!("bonus of {} points", stats.bonus)));
        }
        if stats.red_cards > 1 || stats.yellow_cards > 2 {
            return Err(ScoringError::contract(format!(
                "{} yellow and {} red cards in one match",
                stats.yellow_cards, stats.red_cards
            )));
        }
        let scored_without_playing = stats.goals_scored > 0
            || stats.assists > 0
            || stats.own_goals > 0
            || stats.saves > 0
            || stats.penalties_saved > 0
            || stats.penalties_missed > 0
            || stats.clean_sheet;
        if stats.minutes == 0 && scored_without_playing {
            return Err(ScoringError::contract("match events recorded for a player with 0 minutes"));
        }
        Ok(())
    }
}

/// Points for one match under the default ruleset
pub fn compute_match_points(position: Position, stats: &MatchStats) -> Result<i32, ScoringError> {
    ScoringCalculator::default().compute_match_points(position, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn played(minutes: u16) -> MatchStats {
        MatchStats { minutes, ..Default::default() }
    }

    #[test]
    fn test_appearance_tiers() {
        assert_eq!(compute_match_points(Position::Forward, &played(0)).unwrap(), 0);
        assert_eq!(compute_match_points(Position::Forward, &played(1)).unwrap(), 1);
        assert_eq!(compute_match_points(Position::Forward, &played(59)).unwrap(), 1);
        assert_eq!(compute_match_points(Position::Forward, &played(60)).unwrap(), 2);
        assert_eq!(compute_match_points(Position::Forward, &played(90)).unwrap(), 2);
    }

    #[test]
    fn test_goal_values_by_position() {
        let stats = MatchStats { goals_scored: 1, ..played(90) };
        assert_eq!(compute_match_points(Position::Keeper, &stats).unwrap(), 12);
        assert_eq!(compute_match_points(Position::Defender, &stats).unwrap(), 8);
        assert_eq!(compute_match_points(Position::Midfielder, &stats).unwrap(), 7);
        assert_eq!(compute_match_points(Position::Forward, &stats).unwrap(), 6);
    }

    #[test]
    fn test_clean_sheet_requires_sixty_minutes() {
        let full = MatchStats { clean_sheet: true, ..played(60) };
        let short = MatchStats { clean_sheet: true, ..played(59) };
        assert_eq!(compute_match_points(Position::Defender, &full).unwrap(), 6);
        assert_eq!(compute_match_points(Position::Defender, &short).unwrap(), 1);
        assert_eq!(compute_match_points(Position::Midfielder, &full).unwrap(), 3);
        assert_eq!(compute_match_points(Position::Forward, &full).unwrap(), 2);
    }

    #[test]
    fn test_keeper_saves_and_conceded() {
        let stats = MatchStats { saves: 7, goals_conceded: 3, penalties_saved: 1, ..played(90) };
        // 2 appearance + 2 saves + 5 penalty save - 1 conceded
        assert_eq!(compute_match_points(Position::Keeper, &stats).unwrap(), 8);
        // saves only count for keepers; conceded still counts for defenders
        let stats = MatchStats { saves: 7, goals_conceded: 3, ..played(90) };
        assert_eq!(compute_match_points(Position::Defender, &stats).unwrap(), 1);
        assert_eq!(compute_match_points(Position::Midfielder, &stats).unwrap(), 2);
    }

    #[test]
    fn test_defender_defensive_contribution_threshold() {
        let below = MatchStats { tackles: 4, clearances_blocks_interceptions: 5, ..played(90) };
        let at = MatchStats { tackles: 4, clearances_blocks_interceptions: 6, ..played(90) };
        let calc = ScoringCalculator::default();
        assert_eq!(calc.breakdown(Position::Defender, &below).unwrap().defensive_contribution, 0);
        assert_eq!(calc.breakdown(Position::Defender, &at).unwrap().defensive_contribution, 2);
        // recoveries do not count for defenders
        let with_recoveries = MatchStats { recoveries: 10, ..below };
        assert_eq!(
            calc.breakdown(Position::Defender, &with_recoveries).unwrap().defensive_contribution,
            0
        );
    }

    #[test]
    fn test_midfielder_defensive_contribution_threshold() {
        let calc = ScoringCalculator::default();
        let below = MatchStats {
            tackles: 3,
            clearances_blocks_interceptions: 3,
            recoveries: 5,
            ..played(90)
        };
        let at = MatchStats { recoveries: 6, ..below.clone() };
        assert_eq!(calc.breakdown(Position::Midfielder, &below).unwrap().defensive_contribution, 0);
        assert_eq!(calc.breakdown(Position::Midfielder, &at).unwrap().defensive_contribution, 2);
        assert_eq!(calc.breakdown(Position::Forward, &at).unwrap().defensive_contribution, 2);
        assert_eq!(calc.breakdown(Position::Keeper, &at).unwrap().defensive_contribution, 0);
    }

    #[test]
    fn test_red_card_replaces_yellow() {
        let yellow = MatchStats { yellow_cards: 1, ..played(90) };
        let red = MatchStats { yellow_cards: 1, red_cards: 1, ..played(70) };
        assert_eq!(compute_match_points(Position::Midfielder, &yellow).unwrap(), 1);
        assert_eq!(compute_match_points(Position::Midfielder, &red).unwrap(), -1);
    }

    #[test]
    fn test_card_from_bench_without_minutes() {
        let stats = MatchStats { yellow_cards: 1, ..played(0) };
        assert_eq!(compute_match_points(Position::Forward, &stats).unwrap(), -1);
        assert!(stats.appeared());
    }

    #[test]
    fn test_misc_deductions_and_bonus() {
        let stats = MatchStats {
            own_goals: 1,
            penalties_missed: 1,
            assists: 2,
            bonus: 3,
            ..played(90)
        };
        // 2 + 6 - 2 - 2 + 3
        assert_eq!(compute_match_points(Position::Forward, &stats).unwrap(), 7);
    }

    #[test]
    fn test_contract_violations() {
        let too_long = played(200);
        assert!(matches!(
            compute_match_points(Position::Forward, &too_long),
            Err(ScoringError::InputContractViolation { .. })
        ));
        let ghost_goal = MatchStats { goals_scored: 1, ..played(0) };
        assert!(compute_match_points(Position::Forward, &ghost_goal).is_err());
        let big_bonus = MatchStats { bonus: 4, ..played(90) };
        assert!(compute_match_points(Position::Forward, &big_bonus).is_err());
    }

    #[test]
    fn test_player_without_stats_scores_zero() {
        let player = Player::new(1, "Bench Warmer", Position::Defender, 1, 40);
        assert_eq!(ScoringCalculator::default().compute_player_points(&player, 3).unwrap(), 0);
    }

    fn arb_stats() -> impl Strategy<Value = MatchStats> {
        (1u16..=120, 0u8..4, 0u8..4, any::<bool>(), 0u8..6, 0u8..12, 0u8..15, 0u8..15, 0u8..15)
            .prop_map(|(minutes, goals, assists, cs, conceded, saves, tkl, cbi, rec)| MatchStats {
                minutes,
                goals_scored: goals,
                assists,
                clean_sheet: cs,
                goals_conceded: conceded,
                saves,
                tackles: tkl,
                clearances_blocks_interceptions: cbi,
                recoveries: rec,
                ..Default::default()
            })
    }

    proptest! {
        #[test]
        fn prop_scoring_is_pure(stats in arb_stats(), code in 1u8..=4) {
            let position = Position::from_code(code).unwrap();
            let calc = ScoringCalculator::default();
            let first = calc.compute_match_points(position, &stats).unwrap();
            let second = calc.compute_match_points(position, &stats.clone()).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(first, calc.breakdown(position, &stats).unwrap().total());
        }
    }
}
