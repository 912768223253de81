use crate::error::ModelError;
use crate::player::{Gameweek, Player, PlayerId};
use crate::position::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Player catalogue snapshot for one gameweek
///
/// The catalogue is the read-only view of the player pool every engine
/// component works against. Projections and availability are updated by the
/// caller between planner invocations, never during one.
#[derive(Debug, Clone, Default)]
pub struct PlayerCatalogue {
    players: BTreeMap<PlayerId, Player>,
}

#[derive(Serialize, Deserialize)]
struct CatalogueSnapshot {
    players: Vec<Player>,
}

impl PlayerCatalogue {
    /// Create a new empty catalogue
    pub fn new() -> Self {
        Self { players: BTreeMap::new() }
    }

    /// Build a catalogue, rejecting duplicate identities
    pub fn from_players<I>(players: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = Player>,
    {
        let mut catalogue = Self::new();
        for player in players {
            catalogue.insert(player)?;
        }
        Ok(catalogue)
    }

    /// Parse a `{"players": [...]}` snapshot
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let snapshot: CatalogueSnapshot = serde_json::from_str(json)?;
        let catalogue = Self::from_players(snapshot.players)?;
        info!("Loaded {} players into catalogue", catalogue.len());
        Ok(catalogue)
    }

    pub fn to_json_string(&self) -> Result<String, ModelError> {
        let snapshot = CatalogueSnapshot { players: self.players.values().cloned().collect() };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    pub fn insert(&mut self, player: Player) -> Result<(), ModelError> {
        if self.players.contains_key(&player.id) {
            return Err(ModelError::contract(format!("duplicate player id {}", player.id)));
        }
        self.players.insert(player.id, player);
        Ok(())
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Look up a player that the caller claims exists
    pub fn player(&self, id: PlayerId) -> Result<&Player, ModelError> {
        self.players.get(&id).ok_or(ModelError::UnknownPlayer { player_id: id })
    }

    /// Replace the projection of a player for one gameweek
    pub fn set_projection(
        &mut self,
        id: PlayerId,
        gameweek: Gameweek,
        points: f64,
    ) -> Result<(), ModelError> {
        let player =
            self.players.get_mut(&id).ok_or(ModelError::UnknownPlayer { player_id: id })?;
        player.projections.insert(gameweek, points);
        Ok(())
    }

    /// Iterate players in identity order
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn by_position(&self, position: Position) -> impl Iterator<Item = &Player> {
        self.players.values().filter(move |p| p.position == position)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
