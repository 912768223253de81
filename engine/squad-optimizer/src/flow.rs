//! Exact feasibility check and cheapest squad via min-cost flow.
//!
//! The network is source -> position -> player -> club -> sink. Position
//! edges carry the remaining quota, club edges the remaining club cap and
//! player edges cost the player's price. A flow saturating every quota is a
//! valid squad and the minimum cost flow is the cheapest one.

use crate::error::{InfeasibilityReason, OptimizeError};
use crate::lineup::ValueTable;
use crate::search::price_of;
use squad_model::{PlayerId, Position, Price, SquadRules, TeamId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone)]
struct Edge {
    to: usize,
    capacity: i64,
    cost: i64,
}

#[derive(Debug, Default)]
struct FlowGraph {
    edges: Vec<Edge>,
    adjacency: Vec<Vec<usize>>,
}

impl FlowGraph {
    fn with_nodes(n: usize) -> Self {
        Self { edges: Vec::new(), adjacency: vec![Vec::new(); n] }
    }

    fn add_node(&mut self) -> usize {
        self.adjacency.push(Vec::new());
        self.adjacency.len() - 1
    }

    /// Returns the index of the forward edge; its reverse is `index ^ 1`
    fn add_edge(&mut self, from: usize, to: usize, capacity: i64, cost: i64) -> usize {
        let index = self.edges.len();
        self.edges.push(Edge { to, capacity, cost });
        self.adjacency[from].push(index);
        self.edges.push(Edge { to: from, capacity: 0, cost: -cost });
        self.adjacency[to].push(index + 1);
        index
    }

    /// Successive shortest paths with SPFA. Returns (flow, cost).
    fn min_cost_flow(&mut self, source: usize, sink: usize, limit: i64) -> (i64, i64) {
        let n = self.adjacency.len();
        let mut flow = 0;
        let mut cost = 0;
        while flow < limit {
            let mut dist = vec![i64::MAX; n];
            let mut via = vec![usize::MAX; n];
            let mut queued = vec![false; n];
            let mut queue = VecDeque::new();
            dist[source] = 0;
            queue.push_back(source);
            queued[source] = true;
            while let Some(node) = queue.pop_front() {
                queued[node] = false;
                for &e in &self.adjacency[node] {
                    let edge = &self.edges[e];
                    if edge.capacity > 0 && dist[node] + edge.cost < dist[edge.to] {
                        dist[edge.to] = dist[node] + edge.cost;
                        via[edge.to] = e;
                        if !queued[edge.to] {
                            queued[edge.to] = true;
                            queue.push_back(edge.to);
                        }
                    }
                }
            }
            if dist[sink] == i64::MAX {
                break;
            }

            let mut push = limit - flow;
            let mut node = sink;
            while node != source {
                let e = via[node];
                push = push.min(self.edges[e].capacity);
                node = self.edges[e ^ 1].to;
            }
            let mut node = sink;
            while node != source {
                let e = via[node];
                self.edges[e].capacity -= push;
                self.edges[e ^ 1].capacity += push;
                node = self.edges[e ^ 1].to;
            }
            flow += push;
            cost += push * dist[sink];
        }
        (flow, cost)
    }
}

/// Cheapest set of players completing `locked` into a squad.
///
/// Only position quotas and the club cap constrain the flow; the caller
/// compares the returned cost, locked players included, with the budget.
/// `prices` overrides catalogue prices for players already owned.
pub(crate) fn cheapest_completion(
    table: &ValueTable,
    rules: &SquadRules,
    locked: &BTreeSet<PlayerId>,
    prices: &BTreeMap<PlayerId, Price>,
) -> Result<(Vec<PlayerId>, Price), OptimizeError> {
    let mut remaining = rules.quotas;
    let mut club_used: BTreeMap<TeamId, u8> = BTreeMap::new();
    let mut locked_cost = Price::ZERO;
    for id in locked {
        let entry = table.entry(*id)?;
        remaining.remove(entry.position);
        *club_used.entry(entry.team).or_insert(0) += 1;
        locked_cost += price_of(entry, prices);
    }

    let mut candidates: Vec<_> = table.entries().filter(|e| !locked.contains(&e.id)).collect();
    candidates.sort_by_key(|e| e.id);

    let mut eligible = [0usize; 4];
    for entry in &candidates {
        eligible[entry.position.index()] += 1;
    }
    for position in Position::ALL {
        let needed = remaining.get(position);
        let available = eligible[position.index()];
        if available < usize::from(needed) {
            return Err(OptimizeError::Infeasible(InfeasibilityReason::PositionQuota {
                position,
                needed,
                available,
            }));
        }
    }

    let source = 0;
    let sink = 1;
    let mut graph = FlowGraph::with_nodes(2);
    let position_nodes: Vec<usize> = Position::ALL
        .iter()
        .map(|position| {
            let node = graph.add_node();
            graph.add_edge(source, node, i64::from(remaining.get(*position)), 0);
            node
        })
        .collect();

    let mut club_nodes: BTreeMap<TeamId, usize> = BTreeMap::new();
    let mut player_edges = Vec::with_capacity(candidates.len());
    for entry in &candidates {
        let club = match club_nodes.get(&entry.team) {
            Some(node) => *node,
            None => {
                let node = graph.add_node();
                let used = club_used.get(&entry.team).copied().unwrap_or(0);
                let room = rules.max_per_team.saturating_sub(used);
                graph.add_edge(node, sink, i64::from(room), 0);
                club_nodes.insert(entry.team, node);
                node
            }
        };
        let player = graph.add_node();
        let edge = graph.add_edge(
            position_nodes[entry.position.index()],
            player,
            1,
            i64::from(price_of(entry, prices).to_tenths()),
        );
        graph.add_edge(player, club, 1, 0);
        player_edges.push((entry.id, edge));
    }

    let needed = i64::from(remaining.total());
    let (flow, cost) = graph.min_cost_flow(source, sink, needed);
    if flow < needed {
        return Err(OptimizeError::Infeasible(InfeasibilityReason::ClubCap));
    }

    let chosen = player_edges
        .into_iter()
        .filter(|(_, edge)| graph.edges[*edge].capacity == 0)
        .map(|(id, _)| id)
        .collect();
    let cost = i32::try_from(cost)
        .map_err(|_| OptimizeError::contract("squad cost overflows the price range"))?;
    Ok((chosen, locked_cost + Price::from_tenths(cost)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use squad_model::{Player, PlayerCatalogue, PositionCounts};

    fn table(players: Vec<Player>) -> ValueTable {
        let catalogue = PlayerCatalogue::from_players(players).unwrap();
        ValueTable::build(&catalogue, &[1])
    }

    fn cheapest(
        table: &ValueTable,
        rules: &SquadRules,
        locked: &BTreeSet<PlayerId>,
    ) -> Result<(Vec<PlayerId>, Price), OptimizeError> {
        cheapest_completion(table, rules, locked, &BTreeMap::new())
    }

    fn pool(per_team: u16, teams: u16) -> Vec<Player> {
        let mut players = Vec::new();
        let mut id = 1;
        for team in 1..=teams {
            for n in 0..per_team {
                let position = Position::ALL[(n % 4) as usize];
                players.push(Player::new(id, &format!("p{id}"), position, team, 40 + id as i32));
                id += 1;
            }
        }
        players
    }

    #[test]
    fn test_cheapest_squad_respects_quotas_and_club_cap() {
        let table = table(pool(8, 10));
        let rules = SquadRules::default();
        let (ids, cost) = cheapest(&table, &rules, &BTreeSet::new()).unwrap();

        assert_eq!(ids.len(), 15);
        let mut counts = PositionCounts::default();
        let mut clubs: BTreeMap<TeamId, u8> = BTreeMap::new();
        let mut total = Price::ZERO;
        for id in &ids {
            let entry = table.entry(*id).unwrap();
            counts.add(entry.position);
            *clubs.entry(entry.team).or_insert(0) += 1;
            total += entry.price;
        }
        assert_eq!(counts, rules.quotas);
        assert!(clubs.values().all(|n| *n <= 3));
        assert_eq!(total, cost);
    }

    #[test]
    fn test_flow_picks_cheapest_keepers() {
        let mut players = pool(8, 10);
        players.push(Player::new(500, "cheap-a", Position::Keeper, 11, 10));
        players.push(Player::new(501, "cheap-b", Position::Keeper, 12, 11));
        let table = table(players);
        let (ids, _) = cheapest(&table, &SquadRules::default(), &BTreeSet::new()).unwrap();
        assert!(ids.contains(&PlayerId(500)));
        assert!(ids.contains(&PlayerId(501)));
    }

    #[test]
    fn test_club_cap_infeasibility() {
        // Enough players per position, but all from one club
        let table = table(pool(20, 1));
        let err = cheapest(&table, &SquadRules::default(), &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, OptimizeError::Infeasible(InfeasibilityReason::ClubCap)));
    }

    #[test]
    fn test_position_quota_infeasibility() {
        let players = vec![Player::new(1, "solo", Position::Keeper, 1, 40)];
        let err = cheapest(&table(players), &SquadRules::default(), &BTreeSet::new()).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::Infeasible(InfeasibilityReason::PositionQuota {
                position: Position::Defender,
                ..
            })
        ));
    }

    #[test]
    fn test_large_position_pools_are_counted_in_full() {
        // 300 midfielders, more than a u8 can count
        let mut players = Vec::new();
        let mut id = 1;
        for team in 1..=20u16 {
            let layout = [
                (Position::Keeper, 2),
                (Position::Defender, 3),
                (Position::Midfielder, 15),
                (Position::Forward, 2),
            ];
            for (position, count) in layout {
                for _ in 0..count {
                    let price = 40 + (id % 30) as i32;
                    players.push(Player::new(id, &format!("p{id}"), position, team, price));
                    id += 1;
                }
            }
        }
        let table = table(players);
        let midfielders = table.entries().filter(|e| e.position == Position::Midfielder).count();
        assert_eq!(midfielders, 300);

        let (ids, _) = cheapest(&table, &SquadRules::default(), &BTreeSet::new()).unwrap();
        assert_eq!(ids.len(), 15);
    }

    #[test]
    fn test_locked_players_reduce_the_network() {
        let table = table(pool(8, 10));
        let locked: BTreeSet<PlayerId> = [PlayerId(80), PlayerId(79)].into_iter().collect();
        let (ids, cost) = cheapest(&table, &SquadRules::default(), &locked).unwrap();
        assert_eq!(ids.len(), 13);
        assert!(!ids.contains(&PlayerId(80)));
        let locked_price =
            table.entry(PlayerId(80)).unwrap().price + table.entry(PlayerId(79)).unwrap().price;
        assert!(cost > locked_price);
    }
}
