use crate::catalogue::PlayerCatalogue;
use crate::error::ModelError;
use crate::player::{PlayerId, TeamId};
use crate::price::Price;
use crate::rules::{PositionCounts, SquadRules};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A squad slot together with what was paid for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadMember {
    pub player_id: PlayerId,
    pub purchase_price: Price,
}

/// The 15-player squad and the money left in the bank
///
/// A `Squad` is a value: transfers produce a new squad instead of mutating
/// shared state, so planner branches can hold their own copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SquadRecord")]
pub struct Squad {
    members: Vec<SquadMember>,
    bank: Price,
}

#[derive(Deserialize)]
struct SquadRecord {
    members: Vec<SquadMember>,
    bank: Price,
}

impl From<SquadRecord> for Squad {
    fn from(record: SquadRecord) -> Self {
        Squad::new(record.members, record.bank)
    }
}

impl Squad {
    pub fn new(members: Vec<SquadMember>, bank: Price) -> Self {
        let mut squad = Self { members, bank };
        squad.members.sort_by_key(|m| m.player_id);
        squad
    }

    /// Buy the given players at current prices out of `budget`
    pub fn purchase(
        catalogue: &PlayerCatalogue,
        ids: &[PlayerId],
        budget: Price,
    ) -> Result<Self, ModelError> {
        let mut members = Vec::with_capacity(ids.len());
        let mut spent = Price::ZERO;
        for id in ids {
            let player = catalogue.player(*id)?;
            spent += player.price;
            members.push(SquadMember { player_id: *id, purchase_price: player.price });
        }
        Ok(Self::new(members, budget - spent))
    }

    pub fn members(&self) -> &[SquadMember] {
        &self.members
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members.iter().map(|m| m.player_id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.members.binary_search_by_key(&id, |m| m.player_id).is_ok()
    }

    pub fn member(&self, id: PlayerId) -> Option<&SquadMember> {
        self.members.binary_search_by_key(&id, |m| m.player_id).ok().map(|i| &self.members[i])
    }

    pub fn bank(&self) -> Price {
        self.bank
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// What a member fetches if sold now
    pub fn selling_price(
        &self,
        catalogue: &PlayerCatalogue,
        id: PlayerId,
    ) -> Result<Price, ModelError> {
        let member = self
            .member(id)
            .ok_or_else(|| ModelError::contract(format!("player {id} is not in the squad")))?;
        let current = catalogue.player(id)?.price;
        Ok(Price::selling_price(member.purchase_price, current))
    }

    /// Bank plus the selling price of every member
    pub fn selling_value(&self, catalogue: &PlayerCatalogue) -> Result<Price, ModelError> {
        let mut value = self.bank;
        for member in &self.members {
            value += self.selling_price(catalogue, member.player_id)?;
        }
        Ok(value)
    }

    /// Sum of current catalogue prices of the members
    pub fn total_price(&self, catalogue: &PlayerCatalogue) -> Result<Price, ModelError> {
        let mut total = Price::ZERO;
        for member in &self.members {
            total += catalogue.player(member.player_id)?.price;
        }
        Ok(total)
    }

    /// Sell `out` and buy `incoming` at its current price.
    ///
    /// Only the bank is checked here; composition is checked by `validate`.
    pub fn with_transfer(
        &self,
        catalogue: &PlayerCatalogue,
        out: PlayerId,
        incoming: PlayerId,
    ) -> Result<Squad, ModelError> {
        if self.contains(incoming) {
            return Err(ModelError::contract(format!("player {incoming} is already in the squad")));
        }
        let sale = self.selling_price(catalogue, out)?;
        let cost = catalogue.player(incoming)?.price;
        let bank = self.bank + sale - cost;
        if bank.is_negative() {
            return Err(ModelError::squad_rule(format!(
                "cannot afford {incoming}: bank would be {bank}"
            )));
        }
        let mut members: Vec<SquadMember> =
            self.members.iter().filter(|m| m.player_id != out).copied().collect();
        members.push(SquadMember { player_id: incoming, purchase_price: cost });
        Ok(Squad::new(members, bank))
    }

    pub fn position_counts(&self, catalogue: &PlayerCatalogue) -> Result<PositionCounts, ModelError> {
        let mut counts = PositionCounts::default();
        for id in self.player_ids() {
            counts.add(catalogue.player(id)?.position);
        }
        Ok(counts)
    }

    pub fn team_counts(
        &self,
        catalogue: &PlayerCatalogue,
    ) -> Result<BTreeMap<TeamId, u8>, ModelError> {
        let mut counts = BTreeMap::new();
        for id in self.player_ids() {
            *counts.entry(catalogue.player(id)?.team).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Check size, position quotas, club cap and budget
    pub fn validate(&self, catalogue: &PlayerCatalogue, rules: &SquadRules) -> Result<(), ModelError> {
        if self.members.len() != rules.squad_size() {
            return Err(ModelError::squad_rule(format!(
                "squad has {} players, expected {}",
                self.members.len(),
                rules.squad_size()
            )));
        }
        let unique: BTreeSet<PlayerId> = self.player_ids().collect();
        if unique.len() != self.members.len() {
            return Err(ModelError::squad_rule("squad contains a duplicate player"));
        }
        let counts = self.position_counts(catalogue)?;
        if counts != rules.quotas {
            return Err(ModelError::squad_rule(format!(
                "position counts {counts:?} do not match quotas {:?}",
                rules.quotas
            )));
        }
        if let Some((team, n)) =
            self.team_counts(catalogue)?.into_iter().find(|(_, n)| *n > rules.max_per_team)
        {
            return Err(ModelError::squad_rule(format!(
                "{n} players from {team}, limit is {}",
                rules.max_per_team
            )));
        }
        if self.bank.is_negative() {
            return Err(ModelError::squad_rule(format!("over budget by {}", -self.bank)));
        }
        Ok(())
    }

    /// Same players regardless of purchase prices or bank
    pub fn same_players(&self, other: &Squad) -> bool {
        self.player_ids().eq(other.player_ids())
    }

    /// Players in `self` that are not in `other`
    pub fn difference(&self, other: &Squad) -> Vec<PlayerId> {
        self.player_ids().filter(|id| !other.contains(*id)).collect()
    }
}
