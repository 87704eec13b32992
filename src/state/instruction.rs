//! Operations accepted by [`Arcade::execute`](super::Arcade::execute).
//!
//! Instructions are plain data so they can arrive as JSON:
//!
//! ```json
//! {"op": "join_queue", "game": 4, "player": "bob", "expected_tails": [7, 8]}
//! ```

use serde::{Deserialize, Serialize};

use super::game::{ContentRef, GameMode};
use super::ids::{GameId, Identity, QueueId, TicketId};
use super::queue::SlotView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    CreateGame {
        title: String,
        art_ref: ContentRef,
        code_ref: ContentRef,
        payout_wallet: Identity,
        max_players: u8,
        #[serde(default)]
        mode: GameMode,
    },
    DeleteMostRecentGame {
        game: GameId,
        older_game: GameId,
    },
    DeleteGame {
        game: GameId,
        younger_game: GameId,
        older_game: GameId,
    },
    InitQueue {
        game: GameId,
        player: Identity,
    },
    InitLadder {
        game: GameId,
        seats: Vec<Identity>,
    },
    JoinQueue {
        game: GameId,
        player: Identity,
        expected_tails: Vec<TicketId>,
    },
    JoinLadder {
        game: GameId,
        slot: usize,
        player: Identity,
        expected_tail: TicketId,
    },
    AdvanceQueue {
        game: GameId,
        expected_current: Vec<TicketId>,
        expected_next: Vec<Option<TicketId>>,
    },
    AdvanceLadder {
        game: GameId,
        winner: TicketId,
        losers: Vec<TicketId>,
    },
    AdvanceTeamLadder {
        game: GameId,
        winners: Vec<TicketId>,
        losers: Vec<TicketId>,
    },
    RetireChampion {
        game: GameId,
        champion: TicketId,
    },
    FinishQueue {
        game: GameId,
        queues: Vec<QueueId>,
    },
    FinishLadder {
        game: GameId,
        queues: Vec<QueueId>,
    },
    UpdateLeaderboard {
        game: GameId,
        name: String,
        score: u64,
        wallet: Identity,
    },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateGame { .. } => "create_game",
            Self::DeleteMostRecentGame { .. } => "delete_most_recent_game",
            Self::DeleteGame { .. } => "delete_game",
            Self::InitQueue { .. } => "init_queue",
            Self::InitLadder { .. } => "init_ladder",
            Self::JoinQueue { .. } => "join_queue",
            Self::JoinLadder { .. } => "join_ladder",
            Self::AdvanceQueue { .. } => "advance_queue",
            Self::AdvanceLadder { .. } => "advance_ladder",
            Self::AdvanceTeamLadder { .. } => "advance_team_ladder",
            Self::RetireChampion { .. } => "retire_champion",
            Self::FinishQueue { .. } => "finish_queue",
            Self::FinishLadder { .. } => "finish_ladder",
            Self::UpdateLeaderboard { .. } => "update_leaderboard",
        }
    }

    /// The existing game the instruction acts on, if any.
    pub fn game(&self) -> Option<GameId> {
        match self {
            Self::CreateGame { .. } => None,
            Self::DeleteMostRecentGame { game, .. }
            | Self::DeleteGame { game, .. }
            | Self::InitQueue { game, .. }
            | Self::InitLadder { game, .. }
            | Self::JoinQueue { game, .. }
            | Self::JoinLadder { game, .. }
            | Self::AdvanceQueue { game, .. }
            | Self::AdvanceLadder { game, .. }
            | Self::AdvanceTeamLadder { game, .. }
            | Self::RetireChampion { game, .. }
            | Self::FinishQueue { game, .. }
            | Self::FinishLadder { game, .. }
            | Self::UpdateLeaderboard { game, .. } => Some(*game),
        }
    }
}

/// What an applied instruction changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    GameCreated {
        game: GameId,
    },
    GameDeleted {
        game: GameId,
        /// Queues removed along with the game
        queues: Vec<QueueId>,
    },
    /// Tickets issued by an init or join, with the resulting seats
    Queued {
        tickets: Vec<TicketId>,
        slots: Vec<SlotView>,
    },
    Advanced {
        slots: Vec<SlotView>,
    },
    Finished {
        queues: Vec<QueueId>,
    },
    LeaderboardUpdated {
        rank: Option<usize>,
    },
}
