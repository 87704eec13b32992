//! Errors raised by the arcade engines.
//!
//! Every error aborts the whole operation before any record is touched.
//! Callers that hit [`ArcadeError::StaleReference`] should re-read the live
//! state and retry; every other kind is final for the given arguments.

use thiserror::Error;

use super::game::GameMode;
use super::ids::{GameId, Identity, QueueId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArcadeError {
    #[error("{signer} is not allowed to {action}")]
    Unauthorized {
        signer: Identity,
        action: &'static str,
    },

    #[error("stale {what}: expected {expected}, found {found}")]
    StaleReference {
        what: &'static str,
        expected: String,
        found: String,
    },

    #[error("slot {slot} has nobody to advance")]
    EmptySlotAdvance { slot: usize },

    #[error("slot {slot} already has {queue} attached")]
    SlotOccupiedConflict { slot: usize, queue: QueueId },

    #[error("{game} is not the most recent game ({head} is)")]
    NotMostRecent { game: GameId, head: GameId },

    #[error("slot {slot} still has {waiting} waiting")]
    PrematureFinish { slot: usize, waiting: usize },

    #[error("unknown game {0}")]
    UnknownGame(GameId),

    #[error("unknown queue {0}")]
    UnknownQueue(QueueId),

    #[error("slot {slot} has no queue attached")]
    SlotDetached { slot: usize },

    #[error("slot {slot} has drained and must be finished before it accepts players")]
    SlotDrained { slot: usize },

    #[error("slot {slot} is out of range for a {max_players}-player game")]
    SlotOutOfRange { slot: usize, max_players: u8 },

    #[error("expected {expected} {what}, got {got}")]
    Arity {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{mode} games do not support {operation}")]
    ModeMismatch {
        mode: GameMode,
        operation: &'static str,
    },

    #[error("{mode} games cannot seat {max_players} players")]
    InvalidPlayerCount { mode: GameMode, max_players: u8 },

    #[error("{field} is too long ({len} > {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl ArcadeError {
    pub(crate) fn stale(
        what: &'static str,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::StaleReference {
            what,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn arity(what: &'static str, expected: usize, got: usize) -> Result<(), Self> {
        if expected == got {
            Ok(())
        } else {
            Err(Self::Arity {
                what,
                expected,
                got,
            })
        }
    }

    /// Whether re-reading the live state and retrying can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleReference { .. })
    }
}
