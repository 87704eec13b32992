//! In-memory record store.
//!
//! The ledger owns every record by identity: the registry, the games and the
//! slot queues (tickets live inside their queue). It hands out ids from a
//! single counter so no two records ever share one, and it can round-trip
//! through JSON for persistence.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::ArcadeError;
use super::game::{ContentRef, Game, GameMode, NewGame};
use super::ids::{GameId, Identity, QueueId, TicketId};
use super::queue::{attached, SlotQueue, SlotView, Ticket};

/// Deployment-wide anchor of the game directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Identity allowed to manage the catalog
    pub authority: Identity,

    /// Head of the game list
    pub most_recent_game: GameId,

    /// Tail of the game list; never deleted
    pub genesis_game: GameId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    registry: Registry,
    pub(crate) games: BTreeMap<GameId, Game>,
    pub(crate) queues: BTreeMap<QueueId, SlotQueue>,
    next_id: u64,
}

impl Ledger {
    /// Create a ledger whose directory holds only the genesis game.
    pub fn new(authority: Identity, genesis_title: impl Into<String>) -> Self {
        let genesis_id = GameId(1);
        let genesis = Game::new(
            genesis_id,
            NewGame {
                title: genesis_title.into(),
                art_ref: ContentRef::default(),
                code_ref: ContentRef::default(),
                payout_wallet: authority.clone(),
                owner: authority.clone(),
                max_players: 1,
                mode: GameMode::Normal,
            },
        );

        let mut games = BTreeMap::new();
        games.insert(genesis_id, genesis);

        Self {
            registry: Registry {
                authority,
                most_recent_game: genesis_id,
                genesis_game: genesis_id,
            },
            games,
            queues: BTreeMap::new(),
            next_id: genesis_id.0 + 1,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Whether `identity` is the registry authority.
    pub fn is_authority(&self, identity: &Identity) -> bool {
        &self.registry.authority == identity
    }

    pub(crate) fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn game(&self, id: GameId) -> Result<&Game, ArcadeError> {
        self.games.get(&id).ok_or(ArcadeError::UnknownGame(id))
    }

    pub(crate) fn game_mut(&mut self, id: GameId) -> Result<&mut Game, ArcadeError> {
        self.games.get_mut(&id).ok_or(ArcadeError::UnknownGame(id))
    }

    pub fn queue(&self, id: QueueId) -> Result<&SlotQueue, ArcadeError> {
        self.queues.get(&id).ok_or(ArcadeError::UnknownQueue(id))
    }

    /// The queue attached to a game's seat.
    pub fn slot_queue(&self, game: GameId, slot: usize) -> Result<&SlotQueue, ArcadeError> {
        attached(self, self.game(game)?, slot)
    }

    /// Views of every attached slot of a game, in slot order.
    pub fn slot_views(&self, game: GameId) -> Result<Vec<SlotView>, ArcadeError> {
        let game = self.game(game)?;
        game.attached_queues()
            .map(|(slot, _)| attached(self, game, slot).map(SlotQueue::view))
            .collect()
    }

    /// The ticket seated at some slot of `game`, if `ticket` is a current
    /// occupant there.
    pub fn occupant(&self, game: GameId, ticket: TicketId) -> Option<&Ticket> {
        let game = self.games.get(&game)?;
        game.attached_queues()
            .filter_map(|(_, q)| self.queues.get(&q))
            .filter_map(SlotQueue::current)
            .find(|t| t.id == ticket)
    }

    /// All games, by id.
    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// Check every structural invariant and describe each violation found.
    /// An empty result means the ledger is consistent.
    pub fn audit(&self) -> Vec<String> {
        let mut problems = Vec::new();
        self.audit_directory(&mut problems);

        if let Some(highest) = self.highest_id() {
            if self.next_id <= highest {
                problems.push(format!(
                    "next id {} would reuse issued id {}",
                    self.next_id, highest
                ));
            }
        }

        let mut attached_queues = HashSet::new();
        for game in self.games.values() {
            if !game.leaderboard.is_well_ordered() {
                problems.push(format!("{} leaderboard out of order", game.id));
            }
            if game.slot_count() != game.max_players as usize {
                problems.push(format!("{} has {} slots", game.id, game.slot_count()));
            }
            for (slot, queue_id) in game.attached_queues() {
                attached_queues.insert(queue_id);
                match self.queues.get(&queue_id) {
                    None => problems.push(format!("{} slot {} dangles", game.id, slot)),
                    Some(q) if q.game != game.id || q.slot != slot => {
                        problems.push(format!("{} attached to wrong slot", queue_id))
                    }
                    Some(_) => {}
                }
            }
        }

        for queue in self.queues.values() {
            if !attached_queues.contains(&queue.id) {
                problems.push(format!("{} is not attached", queue.id));
            }
            if queue.chain_len() != Some(queue.waiting_count()) {
                problems.push(format!(
                    "{} chain disagrees with waiting count {}",
                    queue.id,
                    queue.waiting_count()
                ));
            }
            let empty = [
                queue.waiting_count() == 0,
                queue.current_id().is_none(),
                queue.tail_id().is_none(),
            ];
            if empty.iter().any(|e| *e != empty[0]) {
                problems.push(format!("{} sentinels disagree", queue.id));
            }
        }
        problems
    }

    /// Largest id held by any game, queue or ticket.
    fn highest_id(&self) -> Option<u64> {
        let games = self.games.keys().map(|id| id.0);
        let queues = self.queues.values().flat_map(|q| {
            std::iter::once(q.id.0).chain(q.tickets().map(|t| t.id.0))
        });
        games.chain(queues).max()
    }

    fn audit_directory(&self, problems: &mut Vec<String>) {
        let head = self.registry.most_recent_game;
        match self.games.get(&head) {
            None => {
                problems.push(format!("head {} missing", head));
                return;
            }
            Some(game) if game.younger_game.is_some() => {
                problems.push(format!("head {} has a younger game", head));
            }
            Some(_) => {}
        }

        let mut seen = HashSet::new();
        let mut cursor = Some(head);
        let mut younger: Option<GameId> = None;
        while let Some(id) = cursor {
            if !seen.insert(id) {
                problems.push(format!("cycle through {}", id));
                return;
            }
            let Some(game) = self.games.get(&id) else {
                problems.push(format!("dangling link to {}", id));
                return;
            };
            if game.younger_game != younger {
                problems.push(format!("{} back-link mismatch", id));
            }
            younger = Some(id);
            cursor = game.older_game;
        }

        if younger != Some(self.registry.genesis_game) {
            problems.push("list does not end at genesis".to_string());
        }
        if seen.len() != self.games.len() {
            problems.push(format!(
                "{} games unreachable from head",
                self.games.len() - seen.len()
            ));
        }
    }

    /// Serialize the whole ledger.
    pub fn to_json(&self) -> Result<String, ArcadeError> {
        serde_json::to_string(self).map_err(|e| ArcadeError::InvalidSnapshot(e.to_string()))
    }

    /// Rebuild a ledger from [`Ledger::to_json`] output, rejecting snapshots
    /// that fail the audit.
    pub fn from_json(json: &str) -> Result<Self, ArcadeError> {
        let ledger: Self =
            serde_json::from_str(json).map_err(|e| ArcadeError::InvalidSnapshot(e.to_string()))?;
        match ledger.audit().first() {
            None => Ok(ledger),
            Some(problem) => Err(ArcadeError::InvalidSnapshot(problem.clone())),
        }
    }
}
