//! Planner scenarios on a small synthetic league

use crate::{
    plan_transfers, GameweekPlanner, PlanAction, PlanError, PlanState, PlannerConfig,
};
use chip_tracker::{ChipError, ChipTracker};
use squad_model::{
    ChipKind, FormationRules, Gameweek, Player, PlayerCatalogue, PlayerId, Position, Price,
    SeasonCalendar, SeasonHalf, Squad, SquadRules, TransferCost,
};
use squad_optimizer::{
    Objective, OptimizeError, OptimizeRequest, OptimizerConfig, SquadOptimizer, SwapMove,
    ValueTable,
};
use transfer_ledger::{LedgerConfig, TransferLedger};

const GAMEWEEKS: [Gameweek; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 37, 38];

/// Ten clubs of ten players with projections that drift by gameweek
fn league() -> PlayerCatalogue {
    let layout = [
        (Position::Keeper, 2),
        (Position::Defender, 3),
        (Position::Midfielder, 3),
        (Position::Forward, 2),
    ];
    let mut players = Vec::new();
    let mut id = 1u32;
    for team in 1..=10u16 {
        for (position, count) in layout {
            for _ in 0..count {
                let price = 40 + (id * 37 % 60) as i32;
                let mut player =
                    Player::new(id, &format!("Player {id:03}"), position, team, price);
                for gw in GAMEWEEKS {
                    let swing = f64::from((id * 7 + u32::from(gw) * 13) % 10) / 4.0;
                    player = player.with_projection(gw, f64::from(price) / 25.0 + swing);
                }
                players.push(player);
                id += 1;
            }
        }
    }
    PlayerCatalogue::from_players(players).unwrap()
}

fn fast_optimizer() -> OptimizerConfig {
    OptimizerConfig {
        max_iterations: 15,
        candidate_pool: 6,
        budget_pool: 3,
        pair_swaps: false,
        pair_pool: 4,
        min_gain: 0.01,
    }
}

fn planner(config: PlannerConfig) -> GameweekPlanner {
    GameweekPlanner::new(SquadRules::default(), fast_optimizer(), config).unwrap()
}

fn quick_config() -> PlannerConfig {
    PlannerConfig { beam_width: 3, top_k: 3, use_chips: false, ..Default::default() }
}

fn starting_squad(catalogue: &PlayerCatalogue) -> Squad {
    let table = ValueTable::build(catalogue, &[1]);
    let optimizer = SquadOptimizer::new(SquadRules::default(), fast_optimizer()).unwrap();
    let request =
        OptimizeRequest::fresh(catalogue, &table, Price::from_tenths(1000), Objective::single(1));
    optimizer.optimize(&request).unwrap().squad
}

fn state_at(catalogue: &PlayerCatalogue, gameweek: Gameweek, balance: u8) -> PlanState {
    PlanState {
        squad: starting_squad(catalogue),
        ledger: TransferLedger::with_balance(LedgerConfig::default(), gameweek, balance).unwrap(),
        chips: ChipTracker::new(SeasonCalendar::default()),
    }
}

/// Adds a cheap high-scoring midfielder from a new club and returns a swap
/// bringing that player in for the first midfielder of the squad
fn breakout_swap(catalogue: &mut PlayerCatalogue, squad: &Squad) -> SwapMove {
    let mut player = Player::new(900, "Breakout", Position::Midfielder, 99, 40);
    for gw in GAMEWEEKS {
        player = player.with_projection(gw, 12.0);
    }
    catalogue.insert(player).unwrap();
    let out = squad
        .player_ids()
        .find(|id| catalogue.get(*id).unwrap().position == Position::Midfielder)
        .unwrap();
    SwapMove::single(out, PlayerId(900))
}

#[test]
fn test_horizon_outside_bounds_is_rejected() {
    let catalogue = league();
    let state = state_at(&catalogue, 1, 1);
    for horizon in [0, PlannerConfig::MAX_HORIZON + 1] {
        let result = plan_transfers(
            &state.squad,
            &state.ledger,
            &state.chips,
            &catalogue,
            horizon,
            &SquadRules::default(),
            &fast_optimizer(),
            &quick_config(),
        );
        assert!(matches!(result, Err(PlanError::InputContractViolation { .. })));
    }
}

#[test]
fn test_plan_transfers_with_defaults() {
    let catalogue = league();
    let state = state_at(&catalogue, 1, 1);
    let config = PlannerConfig { beam_width: 2, top_k: 2, use_chips: false, ..Default::default() };
    let plan = plan_transfers(
        &state.squad,
        &state.ledger,
        &state.chips,
        &catalogue,
        1,
        &SquadRules::default(),
        &OptimizerConfig::default(),
        &config,
    )
    .unwrap();
    assert_eq!(plan.steps.len(), 1);
    assert!(!plan.truncated);
}

#[test]
fn test_plan_transfers_uses_the_given_rules() {
    let catalogue = league();
    let state = state_at(&catalogue, 1, 1);
    let rules = SquadRules { max_per_team: 0, ..SquadRules::default() };
    let result = plan_transfers(
        &state.squad,
        &state.ledger,
        &state.chips,
        &catalogue,
        1,
        &rules,
        &fast_optimizer(),
        &quick_config(),
    );
    assert!(matches!(
        result,
        Err(PlanError::Optimize(OptimizeError::InvalidConfig { .. }))
    ));
}

#[test]
fn test_plan_covers_the_horizon() {
    let catalogue = league();
    let plan = planner(quick_config()).plan(state_at(&catalogue, 1, 1), &catalogue, 3).unwrap();

    assert!(!plan.truncated);
    let gameweeks: Vec<Gameweek> = plan.steps.iter().map(|s| s.gameweek).collect();
    assert_eq!(gameweeks, vec![1, 2, 3]);
    for step in &plan.steps {
        step.squad.validate(&catalogue, &SquadRules::default()).unwrap();
        step.lineup.validate(&FormationRules::default()).unwrap();
        assert!((step.net_points - (step.projected_points - f64::from(step.hit_points))).abs() < 1e-9);
    }
    let total: f64 = plan.steps.iter().map(|s| s.net_points).sum();
    assert!((plan.net_points - total).abs() < 1e-9);
}

#[test]
fn test_default_horizon_is_accepted() {
    let catalogue = league();
    let plan = planner(quick_config())
        .plan(state_at(&catalogue, 1, 1), &catalogue, PlannerConfig::DEFAULT_HORIZON)
        .unwrap();
    assert_eq!(plan.steps.len(), usize::from(PlannerConfig::DEFAULT_HORIZON));
}

#[test]
fn test_horizon_is_clipped_at_season_end() {
    let catalogue = league();
    let plan = planner(quick_config()).plan(state_at(&catalogue, 37, 1), &catalogue, 5).unwrap();
    let gameweeks: Vec<Gameweek> = plan.steps.iter().map(|s| s.gameweek).collect();
    assert_eq!(gameweeks, vec![37, 38]);
    assert!(!plan.truncated);
}

#[test]
fn test_parallel_and_sequential_search_agree() {
    let catalogue = league();
    let parallel = PlannerConfig { parallel: true, ..quick_config() };
    let sequential = PlannerConfig { parallel: false, ..quick_config() };

    let a = planner(parallel).plan(state_at(&catalogue, 1, 2), &catalogue, 3).unwrap();
    let b = planner(sequential).plan(state_at(&catalogue, 1, 2), &catalogue, 3).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_expansion_limit_truncates_with_flag() {
    let catalogue = league();
    let config = PlannerConfig { max_expansions: 1, ..quick_config() };
    let plan = planner(config).plan(state_at(&catalogue, 1, 1), &catalogue, 4).unwrap();

    assert!(plan.truncated);
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.expansions, 1);
}

#[test]
fn test_expansion_limit_holds_within_a_layer() {
    let catalogue = league();
    for parallel in [false, true] {
        // chips alone give the first layer more than two actions
        let config =
            PlannerConfig { max_expansions: 2, parallel, use_chips: true, ..quick_config() };
        let plan = planner(config).plan(state_at(&catalogue, 1, 1), &catalogue, 3).unwrap();

        assert!(plan.truncated);
        assert_eq!(plan.expansions, 2);
        assert_eq!(plan.steps.len(), 1);
        plan.steps[0].squad.validate(&catalogue, &SquadRules::default()).unwrap();
    }
}

#[test]
fn test_free_hit_squad_does_not_persist() {
    let mut catalogue = league();
    let state = state_at(&catalogue, 1, 1);
    let swap = breakout_swap(&mut catalogue, &state.squad);

    let actions = [
        PlanAction::Swap { swap, chip: None },
        PlanAction::Rebuild { chip: ChipKind::FreeHit },
        PlanAction::Hold { chip: None },
    ];
    let (steps, end) = planner(quick_config()).simulate(state, &catalogue, &actions).unwrap();

    assert!(steps[0].squad.contains(PlayerId(900)));
    assert!(!steps[1].squad.same_players(&steps[0].squad));
    assert!(steps[2].squad.same_players(&steps[0].squad));
    assert!(end.squad.same_players(&steps[0].squad));

    assert_eq!(steps[1].hit_points, 0);
    assert!(steps[1].transfers.iter().all(|t| t.cost == TransferCost::Free));
    // the chip week keeps its banked transfer and still earns the next one
    assert_eq!(steps[1].free_transfers, 1);
    assert_eq!(steps[2].free_transfers, 2);
}

#[test]
fn test_wildcard_squad_persists() {
    let catalogue = league();
    let state = state_at(&catalogue, 3, 0);
    let actions = [PlanAction::Rebuild { chip: ChipKind::Wildcard }, PlanAction::Hold { chip: None }];
    let (steps, end) = planner(quick_config()).simulate(state, &catalogue, &actions).unwrap();

    assert_eq!(steps[0].hit_points, 0);
    assert!(steps[1].squad.same_players(&steps[0].squad));
    assert!(steps[1].transfers.is_empty());
    assert!(end.chips.chip_for_gameweek(3) == Some(ChipKind::Wildcard));
}

#[test]
fn test_hits_are_charged_without_free_transfers() {
    let mut catalogue = league();
    let state = state_at(&catalogue, 1, 0);
    let swap = breakout_swap(&mut catalogue, &state.squad);
    let (steps, _) = planner(quick_config())
        .simulate(state, &catalogue, &[PlanAction::Swap { swap, chip: None }])
        .unwrap();

    assert_eq!(steps[0].hit_points, 4);
    assert_eq!(steps[0].transfers[0].cost, TransferCost::Hit { points: 4 });
    assert!((steps[0].net_points - (steps[0].projected_points - 4.0)).abs() < 1e-9);
}

#[test]
fn test_triple_captain_adds_the_captain_again() {
    let catalogue = league();
    let plain = planner(quick_config())
        .simulate(state_at(&catalogue, 2, 1), &catalogue, &[PlanAction::Hold { chip: None }])
        .unwrap()
        .0;
    let triple = planner(quick_config())
        .simulate(
            state_at(&catalogue, 2, 1),
            &catalogue,
            &[PlanAction::Hold { chip: Some(ChipKind::TripleCaptain) }],
        )
        .unwrap()
        .0;

    let captain = catalogue.get(plain[0].captain).unwrap().expected_points(2);
    assert_eq!(plain[0].captain, triple[0].captain);
    assert!((triple[0].projected_points - plain[0].projected_points - captain).abs() < 1e-9);
}

#[test]
fn test_used_chip_cannot_be_planned() {
    let catalogue = league();
    let mut state = state_at(&catalogue, 2, 1);
    state.chips.commit(ChipKind::BenchBoost, 1).unwrap();

    let result = planner(quick_config()).simulate(
        state,
        &catalogue,
        &[PlanAction::Hold { chip: Some(ChipKind::BenchBoost) }],
    );
    assert!(matches!(
        result,
        Err(PlanError::Chip(ChipError::NotAvailable {
            kind: ChipKind::BenchBoost,
            half: SeasonHalf::First
        }))
    ));
}

#[test]
fn test_chip_search_plays_a_chip_when_it_pays() {
    let catalogue = league();
    let config = PlannerConfig { beam_width: 2, top_k: 2, use_chips: true, ..Default::default() };
    let plan = planner(config).plan(state_at(&catalogue, 1, 1), &catalogue, 1).unwrap();

    // Triple Captain alone beats holding without a chip
    assert!(plan.steps[0].chip.is_some());
    assert_eq!(plan.chips().len(), 1);
}

#[test]
fn test_plan_serializes_to_json() {
    let catalogue = league();
    let plan = planner(quick_config()).plan(state_at(&catalogue, 1, 1), &catalogue, 2).unwrap();
    let json = plan.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["steps"].as_array().unwrap().len(), 2);
    assert_eq!(value["truncated"], serde_json::Value::Bool(false));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn plan_totals_match_steps(start in 1u16..=6, balance in 0u8..=5, horizon in 1u16..=3) {
            let catalogue = league();
            let plan = planner(quick_config())
                .plan(state_at(&catalogue, start, balance), &catalogue, horizon)
                .unwrap();

            prop_assert_eq!(plan.steps.len(), usize::from(horizon));
            let hits: u32 = plan.steps.iter().map(|s| s.hit_points).sum();
            prop_assert_eq!(plan.hit_points, hits);
            for (offset, step) in plan.steps.iter().enumerate() {
                prop_assert_eq!(usize::from(step.gameweek), usize::from(start) + offset);
                prop_assert!(step.free_transfers <= 5);
                let paid = step.transfers.iter().map(|t| t.cost.points()).sum::<u32>();
                prop_assert_eq!(paid, step.hit_points);
            }
        }
    }
}
