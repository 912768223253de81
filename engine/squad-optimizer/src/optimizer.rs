use crate::config::OptimizerConfig;
use crate::error::{InfeasibilityReason, OptimizeError};
use crate::flow::cheapest_completion;
use crate::lineup::{lineup_choice, rank_cmp, Objective, ValueTable};
use crate::search::{
    apply_swap, effective_prices, move_cmp, open_slots, price_of, Climb, ScoredMove,
    SearchContext,
};
use serde::Serialize;
use squad_model::{
    Lineup, PlayerCatalogue, PlayerId, Position, Price, Squad, SquadRules, TeamId,
    Transfer, TransferCost,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};
use transfer_ledger::TransferLedger;

/// Inputs of one optimisation call
#[derive(Debug, Clone)]
pub struct OptimizeRequest<'a> {
    pub catalogue: &'a PlayerCatalogue,
    /// Must cover every gameweek of `objective`
    pub table: &'a ValueTable,
    /// `None` builds from scratch; otherwise transfers are counted against it
    pub current: Option<&'a Squad>,
    /// Money available for a fresh build (selling value when rebuilding)
    pub budget: Price,
    /// Players that must stay in (or be part of) the squad
    pub locked: BTreeSet<PlayerId>,
    pub objective: Objective,
    /// Prices transfers beyond the free allotment; `None` makes them free
    pub ledger: Option<&'a TransferLedger>,
}

impl<'a> OptimizeRequest<'a> {
    pub fn fresh(
        catalogue: &'a PlayerCatalogue,
        table: &'a ValueTable,
        budget: Price,
        objective: Objective,
    ) -> Self {
        Self {
            catalogue,
            table,
            current: None,
            budget,
            locked: BTreeSet::new(),
            objective,
            ledger: None,
        }
    }

    pub fn transfers(
        catalogue: &'a PlayerCatalogue,
        table: &'a ValueTable,
        current: &'a Squad,
        ledger: Option<&'a TransferLedger>,
        objective: Objective,
    ) -> Self {
        Self {
            catalogue,
            table,
            current: Some(current),
            budget: current.bank(),
            locked: BTreeSet::new(),
            objective,
            ledger,
        }
    }

    pub fn with_locked<I: IntoIterator<Item = PlayerId>>(mut self, locked: I) -> Self {
        self.locked = locked.into_iter().collect();
        self
    }
}

/// A squad that satisfies every composition rule, with its best lineup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub squad: Squad,
    /// Lineup for the first objective gameweek
    pub lineup: Lineup,
    /// Objective value before hits
    pub projected_points: f64,
    pub transfers: Vec<Transfer>,
    pub hit_points: u32,
    pub iterations: usize,
}

impl Selection {
    pub fn net_points(&self) -> f64 {
        self.projected_points - f64::from(self.hit_points)
    }
}

pub struct SquadOptimizer {
    rules: SquadRules,
    config: OptimizerConfig,
}

impl SquadOptimizer {
    pub fn new(rules: SquadRules, config: OptimizerConfig) -> Result<Self, OptimizeError> {
        config.validate()?;
        rules
            .validate()
            .map_err(|err| OptimizeError::InvalidConfig { message: err.to_string() })?;
        Ok(Self { rules, config })
    }

    pub fn rules(&self) -> &SquadRules {
        &self.rules
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Fresh build without a current squad, otherwise a transfer search
    pub fn optimize(&self, request: &OptimizeRequest<'_>) -> Result<Selection, OptimizeError> {
        match request.current {
            None => self.build_fresh(request),
            Some(_) => self.improve(request),
        }
    }

    /// Objective value of a squad
    pub fn evaluate(&self, request: &OptimizeRequest<'_>, squad: &Squad) -> Result<f64, OptimizeError> {
        let indices = request.objective.indices(request.table)?;
        let ids: Vec<PlayerId> = squad.player_ids().collect();
        request.objective.evaluate(request.table, &indices, &ids, &self.rules.formation)
    }

    /// Build the best squad within `request.budget`, ignoring transfer costs.
    ///
    /// With a current squad this is a rebuild: kept players cost their
    /// selling price and keep their purchase price.
    pub fn build_fresh(&self, request: &OptimizeRequest<'_>) -> Result<Selection, OptimizeError> {
        let prices = effective_prices(request.catalogue, request.current)?;
        self.check_locked(request, &prices, true)?;

        let (cheapest, cheapest_cost) =
            cheapest_completion(request.table, &self.rules, &request.locked, &prices)?;
        if cheapest_cost > request.budget {
            info!(cheapest = %cheapest_cost, budget = %request.budget, "no squad fits the budget");
            return Err(OptimizeError::Infeasible(InfeasibilityReason::Budget {
                cheapest: cheapest_cost,
                budget: request.budget,
            }));
        }

        let locked: Vec<PlayerId> = request.locked.iter().copied().collect();
        let locked_cost = self.locked_cost(request, &prices)?;
        let mut seeds = vec![[locked.clone(), cheapest].concat()];
        if let Some(greedy) = self.greedy_seed(request, &locked, locked_cost, &prices)? {
            seeds.push(greedy);
        }

        let context = SearchContext::new(
            request.catalogue,
            request.table,
            &self.rules,
            &self.config,
            &request.objective,
            &request.locked,
            None,
            None,
        )?;

        let mut best: Option<Climb> = None;
        for ids in seeds {
            let Some(seed) = self.seed_squad(request, &ids)? else {
                continue;
            };
            let climb = context.climb(seed)?;
            debug!(value = climb.value, iterations = climb.iterations, "fresh build seed climbed");
            let replace = match &best {
                None => true,
                Some(current) => climb.value > current.value + self.config.min_gain,
            };
            if replace {
                best = Some(climb);
            }
        }
        let climb = best.ok_or(OptimizeError::Infeasible(InfeasibilityReason::Budget {
            cheapest: cheapest_cost,
            budget: request.budget,
        }))?;
        self.finish(request, climb)
    }

    /// Local search from the current squad, charging hits through the ledger
    pub fn improve(&self, request: &OptimizeRequest<'_>) -> Result<Selection, OptimizeError> {
        let current = request
            .current
            .ok_or_else(|| OptimizeError::contract("improve needs a current squad"))?;
        self.check_current(request, current)?;
        let context = self.context(request, current)?;
        let climb = context.climb(current.clone())?;
        self.finish(request, climb)
    }

    /// Best `k` single or pair moves from the current squad by immediate
    /// net gain. Only moves with a positive gross gain are returned.
    pub fn rank_moves(
        &self,
        request: &OptimizeRequest<'_>,
        k: usize,
    ) -> Result<Vec<ScoredMove>, OptimizeError> {
        let current = request
            .current
            .ok_or_else(|| OptimizeError::contract("ranking moves needs a current squad"))?;
        self.check_current(request, current)?;
        let context = self.context(request, current)?;
        let value = context.evaluate(current)?;
        let mut moves: Vec<ScoredMove> =
            context.single_moves(current, value)?.into_iter().map(|(m, _)| m).collect();
        if self.config.pair_swaps {
            moves.extend(context.pair_moves(current, value)?.into_iter().map(|(m, _)| m));
        }
        moves.retain(|m| m.gain > 0.0);
        moves.sort_by(move_cmp);
        moves.truncate(k);
        Ok(moves)
    }

    fn context<'r>(
        &'r self,
        request: &'r OptimizeRequest<'r>,
        current: &'r Squad,
    ) -> Result<SearchContext<'r>, OptimizeError> {
        SearchContext::new(
            request.catalogue,
            request.table,
            &self.rules,
            &self.config,
            &request.objective,
            &request.locked,
            Some(current),
            request.ledger,
        )
    }

    fn check_current(
        &self,
        request: &OptimizeRequest<'_>,
        current: &Squad,
    ) -> Result<(), OptimizeError> {
        current.validate(request.catalogue, &self.rules)?;
        if let Some(id) = request.locked.iter().find(|id| !current.contains(**id)) {
            return Err(OptimizeError::contract(format!(
                "locked player {id} is not in the current squad"
            )));
        }
        Ok(())
    }

    /// A locked subset must fit the quotas, the club cap and the budget on
    /// its own.
    fn check_locked(
        &self,
        request: &OptimizeRequest<'_>,
        prices: &BTreeMap<PlayerId, Price>,
        check_budget: bool,
    ) -> Result<(), OptimizeError> {
        let mut counts = [0usize; 4];
        let mut clubs: BTreeMap<TeamId, usize> = BTreeMap::new();
        for id in &request.locked {
            let entry = request.table.entry(*id)?;
            counts[entry.position.index()] += 1;
            *clubs.entry(entry.team).or_insert(0) += 1;
        }
        for position in Position::ALL {
            let quota = self.rules.quotas.get(position);
            if counts[position.index()] > usize::from(quota) {
                return Err(OptimizeError::contract(format!(
                    "{} locked {position} players exceed the quota of {quota}",
                    counts[position.index()]
                )));
            }
        }
        let cap = usize::from(self.rules.max_per_team);
        if let Some((team, n)) = clubs.iter().find(|(_, n)| **n > cap) {
            return Err(OptimizeError::contract(format!(
                "{n} locked players from {team} exceed the club cap"
            )));
        }
        if check_budget {
            let cost = self.locked_cost(request, prices)?;
            if cost > request.budget {
                return Err(OptimizeError::contract(format!(
                    "locked players cost {cost}, budget is {}",
                    request.budget
                )));
            }
        }
        Ok(())
    }

    fn locked_cost(
        &self,
        request: &OptimizeRequest<'_>,
        prices: &BTreeMap<PlayerId, Price>,
    ) -> Result<Price, OptimizeError> {
        self.completion_cost(request, &request.locked.iter().copied().collect::<Vec<_>>(), prices)
    }

    fn completion_cost(
        &self,
        request: &OptimizeRequest<'_>,
        ids: &[PlayerId],
        prices: &BTreeMap<PlayerId, Price>,
    ) -> Result<Price, OptimizeError> {
        let mut cost = Price::ZERO;
        for id in ids {
            cost += price_of(request.table.entry(*id)?, prices);
        }
        Ok(cost)
    }

    /// Highest value first, keeping enough money back to fill every open
    /// slot with the cheapest player of its position.
    fn greedy_seed(
        &self,
        request: &OptimizeRequest<'_>,
        locked: &[PlayerId],
        locked_cost: Price,
        prices: &BTreeMap<PlayerId, Price>,
    ) -> Result<Option<Vec<PlayerId>>, OptimizeError> {
        let indices = request.objective.indices(request.table)?;
        let mut candidates: Vec<_> = request
            .table
            .entries()
            .filter(|e| !request.locked.contains(&e.id))
            .map(|e| (e, request.table.window_value(e.id, &indices)))
            .collect();
        candidates.sort_by(|a, b| rank_cmp(a.0, a.1, b.0, b.1));

        let mut cheapest = [None::<Price>; 4];
        for (entry, _) in &candidates {
            let slot = &mut cheapest[entry.position.index()];
            let price = price_of(entry, prices);
            *slot = Some(slot.map_or(price, |p| p.min(price)));
        }

        let mut open = open_slots(request.table, &self.rules, locked)?;
        let mut clubs: BTreeMap<TeamId, u8> = BTreeMap::new();
        for id in locked {
            *clubs.entry(request.table.entry(*id)?.team).or_insert(0) += 1;
        }
        let mut spent = locked_cost;
        let mut picked = locked.to_vec();

        for (entry, _) in &candidates {
            let slot = entry.position.index();
            if open[slot] == 0 {
                continue;
            }
            if clubs.get(&entry.team).copied().unwrap_or(0) >= self.rules.max_per_team {
                continue;
            }
            let price = price_of(entry, prices);
            let mut reserve = Price::ZERO;
            for (i, n) in open.iter().enumerate() {
                let remaining = if i == slot { n - 1 } else { *n };
                let floor = cheapest[i].unwrap_or(Price::ZERO);
                reserve += Price::from_tenths(floor.to_tenths() * i32::from(remaining));
            }
            if spent + price + reserve > request.budget {
                continue;
            }
            spent += price;
            open[slot] -= 1;
            *clubs.entry(entry.team).or_insert(0) += 1;
            picked.push(entry.id);
            if open.iter().all(|n| *n == 0) {
                return Ok(Some(picked));
            }
        }
        debug!("greedy seed could not fill the squad");
        Ok(None)
    }

    /// Turn a set of ids into a squad, rebuilding from the current squad
    /// when there is one
    fn seed_squad(
        &self,
        request: &OptimizeRequest<'_>,
        ids: &[PlayerId],
    ) -> Result<Option<Squad>, OptimizeError> {
        match request.current {
            None => {
                let squad = Squad::purchase(request.catalogue, ids, request.budget)?;
                Ok((!squad.bank().is_negative()).then_some(squad))
            }
            Some(current) => {
                let wanted: BTreeSet<PlayerId> = ids.iter().copied().collect();
                let out: Vec<PlayerId> =
                    current.player_ids().filter(|id| !wanted.contains(id)).collect();
                let incoming: Vec<PlayerId> =
                    wanted.iter().copied().filter(|id| !current.contains(*id)).collect();
                let slack = request.budget - current.selling_value(request.catalogue)?;
                let funded = Squad::new(current.members().to_vec(), current.bank() + slack);
                apply_swap(request.catalogue, &funded, &out, &incoming)
            }
        }
    }

    fn finish(&self, request: &OptimizeRequest<'_>, climb: Climb) -> Result<Selection, OptimizeError> {
        climb.squad.validate(request.catalogue, &self.rules)?;
        let ids: Vec<PlayerId> = climb.squad.player_ids().collect();
        let indices = request.objective.indices(request.table)?;
        let choice = lineup_choice(
            request.catalogue,
            request.table,
            &ids,
            indices[0],
            request.objective.chip,
            &self.rules.formation,
        )?;

        let (transfers, hit_points) = match request.current {
            Some(current) => self.price_transfers(request, current, &climb.squad)?,
            None => (Vec::new(), 0),
        };
        info!(
            projected = climb.value,
            transfers = transfers.len(),
            hit_points,
            iterations = climb.iterations,
            "squad optimised"
        );
        Ok(Selection {
            squad: climb.squad,
            lineup: choice.lineup,
            projected_points: climb.value,
            transfers,
            hit_points,
            iterations: climb.iterations,
        })
    }

    /// Pair sold and bought players by position and tag each transfer as
    /// free or a hit in order
    fn price_transfers(
        &self,
        request: &OptimizeRequest<'_>,
        current: &Squad,
        next: &Squad,
    ) -> Result<(Vec<Transfer>, u32), OptimizeError> {
        let mut out: [Vec<PlayerId>; 4] = Default::default();
        let mut incoming: [Vec<PlayerId>; 4] = Default::default();
        for id in current.difference(next) {
            out[request.table.entry(id)?.position.index()].push(id);
        }
        for id in next.difference(current) {
            incoming[request.table.entry(id)?.position.index()].push(id);
        }
        let pairs: Vec<(PlayerId, PlayerId)> = out
            .iter()
            .zip(incoming.iter())
            .flat_map(|(o, i)| o.iter().copied().zip(i.iter().copied()))
            .collect();

        let count = u8::try_from(pairs.len()).unwrap_or(u8::MAX);
        let charge = request.ledger.map(|l| l.quote(count)).unwrap_or_default();
        let hit = request.ledger.map_or(0, |l| l.config().hit_cost);
        let gameweek = request.objective.gameweeks[0];
        let transfers = pairs
            .into_iter()
            .enumerate()
            .map(|(n, (player_out, player_in))| {
                let cost = if n >= usize::from(charge.free_used) && charge.paid > 0 {
                    TransferCost::Hit { points: hit }
                } else {
                    TransferCost::Free
                };
                Transfer { gameweek, player_out, player_in, cost }
            })
            .collect();
        Ok((transfers, charge.hit_points))
    }
}
