//! Lockstep queues for normal-mode games.
//!
//! A normal game with N seats runs one line of parties. Each seat keeps its
//! own queue record, but every join, advance and finish touches all N of them
//! with the same party, so the seats always agree on who is playing and how
//! many are waiting.
//!
//! Every call names the state it expects to replace (the tails for a join,
//! the current and next tickets for an advance, the attached queues for a
//! finish). A mismatch on any seat rejects the whole call.

use super::error::ArcadeError;
use super::game::{Game, GameMode};
use super::ids::{GameId, Identity, QueueId, TicketId};
use super::ledger::Ledger;
use super::queue::{SlotBatch, SlotReceipt};

fn require_normal(game: &Game, operation: &'static str) -> Result<(), ArcadeError> {
    if game.mode == GameMode::Normal {
        Ok(())
    } else {
        Err(ArcadeError::ModeMismatch {
            mode: game.mode,
            operation,
        })
    }
}

impl Ledger {
    /// Attach a fresh queue to every seat with `player` as the only party.
    pub fn init_queue(
        &mut self,
        game_id: GameId,
        player: Identity,
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_normal(game, "lockstep queues")?;

        let mut batch = SlotBatch::new(game);
        for slot in 0..game.slot_count() {
            batch.open(game, slot, player.clone())?;
        }
        Ok(batch.commit(self))
    }

    /// Append `player` behind the current tail of every seat.
    pub fn join_queue(
        &mut self,
        game_id: GameId,
        player: Identity,
        expected_tails: &[TicketId],
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_normal(game, "lockstep queues")?;
        ArcadeError::arity("expected tails", game.slot_count(), expected_tails.len())?;

        let mut batch = SlotBatch::new(game);
        for (slot, tail) in expected_tails.iter().enumerate() {
            batch.push(self, game, slot, *tail, player.clone())?;
        }
        Ok(batch.commit(self))
    }

    /// The party at the front of every seat has finished playing; move every
    /// seat on to the next party, or to empty.
    pub fn advance_queue(
        &mut self,
        game_id: GameId,
        expected_current: &[TicketId],
        expected_next: &[Option<TicketId>],
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_normal(game, "lockstep queues")?;
        ArcadeError::arity("current occupants", game.slot_count(), expected_current.len())?;
        ArcadeError::arity("next occupants", game.slot_count(), expected_next.len())?;

        let mut batch = SlotBatch::new(game);
        for (slot, (current, next)) in expected_current.iter().zip(expected_next).enumerate() {
            batch.pop(self, game, slot, *current, Some(*next))?;
        }
        Ok(batch.commit(self))
    }

    /// Detach every seat's drained queue so the game can be queued again.
    pub fn finish_queue(
        &mut self,
        game_id: GameId,
        expected_queues: &[QueueId],
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_normal(game, "lockstep queues")?;
        self.detach_all(game_id, expected_queues)
    }

    /// Close every seat of a game, which must all be drained.
    pub(crate) fn detach_all(
        &mut self,
        game_id: GameId,
        expected_queues: &[QueueId],
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        ArcadeError::arity("slot queues", game.slot_count(), expected_queues.len())?;

        let mut batch = SlotBatch::new(game);
        for (slot, queue) in expected_queues.iter().enumerate() {
            batch.close(self, game, slot, *queue)?;
        }
        Ok(batch.commit(self))
    }
}
