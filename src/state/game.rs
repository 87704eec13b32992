//! Game records.
//!
//! A game is one catalog entry: its content references, seat count, play
//! mode, links to its neighbors in the directory, its leaderboard and the
//! queue attached to each seat.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{GameId, Identity, QueueId};
use super::leaderboard::Leaderboard;

/// Most seats a game can have.
pub const MAX_SLOTS: u8 = 4;

/// How a game's slots are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// All slots move together as one queue of parties.
    #[default]
    Normal,
    /// Each slot is a challenger queue; the winner keeps their seat.
    KingOfHill,
    /// Two teams of `max_players / 2` seats; the winning team stays.
    TeamKingOfHill,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::KingOfHill => "king_of_hill",
            Self::TeamKingOfHill => "team_king_of_hill",
        }
    }

    /// Whether the mode uses the elimination ladder.
    pub fn is_ladder(&self) -> bool {
        matches!(self, Self::KingOfHill | Self::TeamKingOfHill)
    }

    /// Whether a game in this mode can have `max_players` seats.
    pub fn supports(&self, max_players: u8) -> bool {
        match self {
            Self::Normal => (1..=MAX_SLOTS).contains(&max_players),
            Self::KingOfHill => (2..=MAX_SLOTS).contains(&max_players),
            Self::TeamKingOfHill => matches!(max_players, 2 | 4),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a seat currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// No queue attached.
    #[default]
    Empty,
    /// A queue is attached; it may have drained but not yet been finished.
    Active(QueueId),
}

impl SlotState {
    pub fn queue(&self) -> Option<QueueId> {
        match self {
            Self::Empty => None,
            Self::Active(queue) => Some(*queue),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Opaque content hash (artwork, game code).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Parameters for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGame {
    pub title: String,
    pub art_ref: ContentRef,
    pub code_ref: ContentRef,
    pub payout_wallet: Identity,
    pub owner: Identity,
    pub max_players: u8,
    pub mode: GameMode,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,

    pub title: String,

    pub art_ref: ContentRef,

    pub code_ref: ContentRef,

    /// Seats, 1 through 4
    pub max_players: u8,

    pub mode: GameMode,

    pub owner: Identity,

    /// Where payouts for this game go
    pub payout_wallet: Identity,

    /// Next game towards genesis
    pub older_game: Option<GameId>,

    /// Next game towards the head
    pub younger_game: Option<GameId>,

    pub leaderboard: Leaderboard,

    /// One entry per seat
    pub slots: Vec<SlotState>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Game {
    /// Build a fresh, unlinked game record.
    pub(crate) fn new(id: GameId, params: NewGame) -> Self {
        Self {
            id,
            title: params.title,
            art_ref: params.art_ref,
            code_ref: params.code_ref,
            max_players: params.max_players,
            mode: params.mode,
            owner: params.owner,
            payout_wallet: params.payout_wallet,
            older_game: None,
            younger_game: None,
            leaderboard: Leaderboard::new(),
            slots: vec![SlotState::Empty; params.max_players as usize],
            created_at: chrono::Utc::now(),
        }
    }

    /// Number of seats.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<SlotState> {
        self.slots.get(index).copied()
    }

    /// Queues currently attached, in slot order.
    pub fn attached_queues(&self) -> impl Iterator<Item = (usize, QueueId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.queue().map(|q| (i, q)))
    }

    /// Whether any seat has a queue attached.
    pub fn has_active_queue(&self) -> bool {
        self.slots.iter().any(|s| !s.is_empty())
    }

    pub fn is_owner(&self, identity: &Identity) -> bool {
        &self.owner == identity
    }

    /// Convert to JSON for sending to clients.
    pub fn to_json(&self) -> serde_json::Value {
        let slots: Vec<serde_json::Value> = self
            .slots
            .iter()
            .map(|s| match s.queue() {
                Some(q) => serde_json::json!(q.to_string()),
                None => serde_json::Value::Null,
            })
            .collect();

        serde_json::json!({
            "game_id": self.id.to_string(),
            "title": self.title,
            "art_ref": self.art_ref,
            "code_ref": self.code_ref,
            "max_players": self.max_players,
            "mode": self.mode.as_str(),
            "owner": self.owner,
            "payout_wallet": self.payout_wallet,
            "older_game": self.older_game.map(|g| g.to_string()),
            "younger_game": self.younger_game.map(|g| g.to_string()),
            "leaderboard": self.leaderboard.to_json(),
            "slots": slots,
            "created_at": self.created_at.to_rfc3339()
        })
    }
}
