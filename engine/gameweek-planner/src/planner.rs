use crate::config::{FreeHitBudget, PlannerConfig};
use crate::error::PlanError;
use crate::plan::{GameweekPlanStep, PlanAction, PlanState, TransferPlan};
use chip_tracker::ChipTracker;
use rayon::prelude::*;
use squad_model::{
    ChipKind, Gameweek, PlayerCatalogue, PlayerId, Price, Squad, SquadRules, Transfer,
    TransferCost,
};
use squad_optimizer::{
    select_lineup, Objective, OptimizeRequest, OptimizerConfig, SquadOptimizer, ValueTable,
};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use transfer_ledger::TransferLedger;

/// Budget headroom standing in for "no budget" on a Free Hit
const UNCONSTRAINED_BUDGET: Price = Price::from_tenths(1_000_000);

/// A partial plan in the beam
#[derive(Debug, Clone)]
struct Node {
    state: PlanState,
    steps: Vec<GameweekPlanStep>,
    reward: f64,
    signature: Vec<String>,
}

fn node_cmp(a: &Node, b: &Node) -> Ordering {
    b.reward.total_cmp(&a.reward).then_with(|| a.signature.cmp(&b.signature))
}

/// Projections and calendar bounds shared by every node of one search
struct SearchWindow<'a> {
    catalogue: &'a PlayerCatalogue,
    table: ValueTable,
    last: Gameweek,
}

/// Beam search over transfers and chips across a short horizon.
///
/// Each gameweek a node branches into: hold, the `top_k` best swaps, and
/// every chip the tracker would accept. Only the best `beam_width` nodes by
/// cumulative net points survive to the next gameweek.
pub struct GameweekPlanner {
    optimizer: SquadOptimizer,
    config: PlannerConfig,
}

impl GameweekPlanner {
    pub fn new(
        rules: SquadRules,
        optimizer: OptimizerConfig,
        config: PlannerConfig,
    ) -> Result<Self, PlanError> {
        config.validate()?;
        Ok(Self { optimizer: SquadOptimizer::new(rules, optimizer)?, config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn rules(&self) -> &SquadRules {
        self.optimizer.rules()
    }

    /// Best plan for `horizon` gameweeks starting at the ledger's open
    /// gameweek. The horizon is clipped at the end of the season.
    pub fn plan(
        &self,
        state: PlanState,
        catalogue: &PlayerCatalogue,
        horizon: u16,
    ) -> Result<TransferPlan, PlanError> {
        let window = self.window(&state, catalogue, horizon)?;
        let start = state.ledger.gameweek();
        let started = Instant::now();
        let deadline = self.config.time_budget_ms.map(Duration::from_millis);

        let mut beam = vec![Node { state, steps: Vec::new(), reward: 0.0, signature: Vec::new() }];
        let mut expansions = 0;
        let mut truncated = false;

        for gameweek in start..=window.last {
            let remaining = self.config.max_expansions.saturating_sub(expansions);
            if remaining == 0 || self.out_of_time(started, deadline) {
                truncated = true;
                break;
            }
            let final_step = gameweek == window.last;

            let mut work = self.layer_work(&beam, gameweek, &window)?;
            if work.len() > remaining {
                work.truncate(remaining);
                truncated = true;
            }
            expansions += work.len();

            let timed_out = AtomicBool::new(false);
            let run = |(parent, action): &(usize, PlanAction)| {
                if self.out_of_time(started, deadline) {
                    timed_out.store(true, AtomicOrdering::Relaxed);
                    return Ok(None);
                }
                self.child(&beam[*parent], gameweek, action, final_step, &window)
            };
            let results: Vec<Option<Node>> = if self.config.parallel {
                work.par_iter().map(run).collect::<Result<_, PlanError>>()?
            } else {
                work.iter().map(run).collect::<Result<_, PlanError>>()?
            };
            truncated |= timed_out.load(AtomicOrdering::Relaxed);

            let mut children: Vec<Node> = results.into_iter().flatten().collect();
            if children.is_empty() {
                truncated = true;
                break;
            }
            children.sort_by(node_cmp);
            children.truncate(self.config.beam_width);
            debug!(gameweek, kept = children.len(), expansions, "beam layer expanded");
            beam = children;
            if truncated {
                break;
            }
        }

        if truncated {
            let steps = beam.first().map_or(0, |n| n.steps.len());
            warn!(expansions, steps, "plan search truncated");
        }
        let best = beam.into_iter().min_by(node_cmp).map(|n| n.steps).unwrap_or_default();
        let plan = TransferPlan::from_steps(best, truncated, expansions);
        info!(
            steps = plan.steps.len(),
            net_points = plan.net_points,
            hit_points = plan.hit_points,
            truncated,
            "transfer plan ready"
        );
        Ok(plan)
    }

    /// Play a fixed sequence of actions from the ledger's open gameweek
    pub fn simulate(
        &self,
        state: PlanState,
        catalogue: &PlayerCatalogue,
        actions: &[PlanAction],
    ) -> Result<(Vec<GameweekPlanStep>, PlanState), PlanError> {
        let horizon = u16::try_from(actions.len())
            .map_err(|_| PlanError::contract("too many actions to simulate"))?;
        let window = self.window(&state, catalogue, horizon)?;
        let start = state.ledger.gameweek();
        if usize::from(window.last - start) + 1 < actions.len() {
            return Err(PlanError::contract("actions run past the end of the season"));
        }

        let mut state = state;
        let mut steps = Vec::with_capacity(actions.len());
        for (gameweek, action) in (start..).zip(actions) {
            let final_step = gameweek == window.last;
            let (step, next) = self
                .step(&state, gameweek, action, final_step, &window)?
                .ok_or_else(|| PlanError::contract(format!("{action:?} is not affordable")))?;
            steps.push(step);
            state = next;
        }
        Ok((steps, state))
    }

    fn window<'a>(
        &self,
        state: &PlanState,
        catalogue: &'a PlayerCatalogue,
        horizon: u16,
    ) -> Result<SearchWindow<'a>, PlanError> {
        if !(1..=PlannerConfig::MAX_HORIZON).contains(&horizon) {
            return Err(PlanError::contract(format!(
                "horizon {horizon} outside 1..={}",
                PlannerConfig::MAX_HORIZON
            )));
        }
        let calendar = state.chips.calendar();
        let start = state.ledger.gameweek();
        if !calendar.contains(start) {
            return Err(PlanError::contract(format!("gameweek {start} is outside the season")));
        }
        state
            .squad
            .validate(catalogue, self.rules())
            .map_err(|err| PlanError::contract(format!("current squad is invalid: {err}")))?;

        let last = (start + horizon - 1).min(calendar.last_gameweek);
        let gameweeks: Vec<Gameweek> = (start..=last).collect();
        Ok(SearchWindow { catalogue, table: ValueTable::build(catalogue, &gameweeks), last })
    }

    /// Candidate actions for a node, in a fixed order
    fn actions(
        &self,
        state: &PlanState,
        gameweek: Gameweek,
        window: &SearchWindow<'_>,
    ) -> Result<Vec<PlanAction>, PlanError> {
        let length = self.config.move_window.min(window.last - gameweek + 1);
        let request = OptimizeRequest::transfers(
            window.catalogue,
            &window.table,
            &state.squad,
            Some(&state.ledger),
            Objective::window(gameweek, length),
        );
        let moves = self.optimizer.rank_moves(&request, self.config.top_k)?;

        let mut actions = vec![PlanAction::Hold { chip: None }];
        actions.extend(moves.iter().map(|m| PlanAction::Swap { swap: m.swap.clone(), chip: None }));
        if !self.config.use_chips {
            return Ok(actions);
        }
        for chip in state.chips.available_chips(gameweek) {
            match chip {
                ChipKind::Wildcard | ChipKind::FreeHit => actions.push(PlanAction::Rebuild { chip }),
                ChipKind::BenchBoost | ChipKind::TripleCaptain => {
                    actions.push(PlanAction::Hold { chip: Some(chip) });
                    if let Some(best) = moves.first() {
                        actions.push(PlanAction::Swap { swap: best.swap.clone(), chip: Some(chip) });
                    }
                }
            }
        }
        Ok(actions)
    }

    fn out_of_time(&self, started: Instant, deadline: Option<Duration>) -> bool {
        deadline.is_some_and(|d| started.elapsed() >= d)
    }

    /// Every (parent, action) pair of one layer, parents in beam order
    fn layer_work(
        &self,
        beam: &[Node],
        gameweek: Gameweek,
        window: &SearchWindow<'_>,
    ) -> Result<Vec<(usize, PlanAction)>, PlanError> {
        let actions: Vec<Vec<PlanAction>> = if self.config.parallel {
            beam.par_iter()
                .map(|node| self.actions(&node.state, gameweek, window))
                .collect::<Result<_, _>>()?
        } else {
            beam.iter()
                .map(|node| self.actions(&node.state, gameweek, window))
                .collect::<Result<_, _>>()?
        };
        Ok(actions
            .into_iter()
            .enumerate()
            .flat_map(|(parent, list)| list.into_iter().map(move |action| (parent, action)))
            .collect())
    }

    fn child(
        &self,
        parent: &Node,
        gameweek: Gameweek,
        action: &PlanAction,
        final_step: bool,
        window: &SearchWindow<'_>,
    ) -> Result<Option<Node>, PlanError> {
        let Some((step, state)) = self.step(&parent.state, gameweek, action, final_step, window)?
        else {
            return Ok(None);
        };
        let mut steps = parent.steps.clone();
        let mut signature = parent.signature.clone();
        signature.push(signature_of(gameweek, &step));
        let reward = parent.reward + step.net_points;
        steps.push(step);
        Ok(Some(Node { state, steps, reward, signature }))
    }

    /// Apply one action. `None` when a rebuild or swap cannot be afforded.
    fn step(
        &self,
        state: &PlanState,
        gameweek: Gameweek,
        action: &PlanAction,
        final_step: bool,
        window: &SearchWindow<'_>,
    ) -> Result<Option<(GameweekPlanStep, PlanState)>, PlanError> {
        let catalogue = window.catalogue;
        let fielded = match action {
            PlanAction::Hold { .. } => state.squad.clone(),
            PlanAction::Swap { swap, .. } => match swap.apply(catalogue, &state.squad)? {
                Some(squad) => squad,
                None => return Ok(None),
            },
            PlanAction::Rebuild { chip } => match self.rebuild(state, gameweek, *chip, window) {
                Ok(squad) => squad,
                Err(PlanError::Infeasible(reason)) => {
                    debug!(gameweek, %chip, %reason, "rebuild skipped");
                    return Ok(None);
                }
                Err(err) => return Err(err),
            },
        };
        fielded
            .validate(catalogue, self.rules())
            .map_err(|err| PlanError::contract(format!("gameweek {gameweek} squad: {err}")))?;

        let mut next = state.clone();
        let chip = action.chip();
        if let Some(chip) = chip {
            next.chips.commit(chip, gameweek)?;
            next.ledger.apply_chip_override(chip);
        }
        let free_transfers = next.ledger.balance();
        let pairs = pair_by_position(catalogue, &state.squad, &fielded)?;
        let count = u8::try_from(pairs.len()).unwrap_or(u8::MAX);
        let charge = next.ledger.record_transfers(count);
        let hit = next.ledger.config().hit_cost;
        let transfers = pairs
            .into_iter()
            .enumerate()
            .map(|(n, (player_out, player_in))| Transfer {
                gameweek,
                player_out,
                player_in,
                cost: if n >= usize::from(charge.free_used) && charge.paid > 0 {
                    TransferCost::Hit { points: hit }
                } else {
                    TransferCost::Free
                },
            })
            .collect();

        let choice = select_lineup(catalogue, &fielded, gameweek, chip, &self.rules().formation)?;
        let hit_points = charge.hit_points;
        let step = GameweekPlanStep {
            gameweek,
            captain: choice.lineup.captain,
            vice_captain: choice.lineup.vice_captain,
            lineup: choice.lineup,
            squad: fielded.clone(),
            transfers,
            chip,
            free_transfers,
            hit_points,
            projected_points: choice.projected_points,
            net_points: choice.projected_points - f64::from(hit_points),
        };

        // A Free Hit squad only exists for its own gameweek
        next.squad = if chip == Some(ChipKind::FreeHit) { state.squad.clone() } else { fielded };
        if !final_step {
            next.ledger.advance_gameweek(next.chips.calendar())?;
        }
        Ok(Some((step, next)))
    }

    fn rebuild(
        &self,
        state: &PlanState,
        gameweek: Gameweek,
        chip: ChipKind,
        window: &SearchWindow<'_>,
    ) -> Result<Squad, PlanError> {
        let value = state.squad.selling_value(window.catalogue)?;
        let (budget, objective) = match chip {
            ChipKind::Wildcard => (value, Objective::window(gameweek, window.last - gameweek + 1)),
            ChipKind::FreeHit => {
                let budget = match self.config.free_hit_budget {
                    FreeHitBudget::Unconstrained => value + UNCONSTRAINED_BUDGET,
                    FreeHitBudget::SquadValue => value,
                };
                (budget, Objective::single(gameweek))
            }
            other => {
                return Err(PlanError::contract(format!("{other} does not rebuild the squad")));
            }
        };
        let request = OptimizeRequest {
            catalogue: window.catalogue,
            table: &window.table,
            current: Some(&state.squad),
            budget,
            locked: Default::default(),
            objective,
            ledger: None,
        };
        Ok(self.optimizer.build_fresh(&request)?.squad)
    }
}

/// Match sold and bought players of the same position, lowest ids first
fn pair_by_position(
    catalogue: &PlayerCatalogue,
    before: &Squad,
    after: &Squad,
) -> Result<Vec<(PlayerId, PlayerId)>, PlanError> {
    let mut out: [Vec<PlayerId>; 4] = Default::default();
    let mut incoming: [Vec<PlayerId>; 4] = Default::default();
    for id in before.difference(after) {
        out[catalogue.player(id)?.position.index()].push(id);
    }
    for id in after.difference(before) {
        incoming[catalogue.player(id)?.position.index()].push(id);
    }
    Ok(out
        .iter()
        .zip(incoming.iter())
        .flat_map(|(o, i)| o.iter().copied().zip(i.iter().copied()))
        .collect())
}

fn signature_of(gameweek: Gameweek, step: &GameweekPlanStep) -> String {
    let chip = step.chip.map(|c| c.to_string()).unwrap_or_default();
    let moves: Vec<String> =
        step.transfers.iter().map(|t| format!("{}>{}", t.player_out, t.player_in)).collect();
    format!("{gameweek:02}|{chip}|{}", moves.join(","))
}

/// Plan transfers and chips for the given squad rules and search settings
#[allow(clippy::too_many_arguments)]
pub fn plan_transfers(
    current_squad: &Squad,
    ledger: &TransferLedger,
    chips: &ChipTracker,
    catalogue: &PlayerCatalogue,
    horizon: u16,
    rules: &SquadRules,
    optimizer: &OptimizerConfig,
    config: &PlannerConfig,
) -> Result<TransferPlan, PlanError> {
    let planner = GameweekPlanner::new(*rules, optimizer.clone(), config.clone())?;
    let state = PlanState {
        squad: current_squad.clone(),
        ledger: ledger.clone(),
        chips: chips.clone(),
    };
    planner.plan(state, catalogue, horizon)
}
