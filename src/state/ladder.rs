//! Elimination ladder for king-of-the-hill games.
//!
//! Every seat is its own challenger queue. After a round the winner keeps
//! their seat and every other seat moves on to its next challenger:
//!
//! ```text
//!   before advance(winner = A, losers = [B])      after
//!
//!   slot 0: A                                     slot 0: A
//!   slot 1: B → C → D → E → F                     slot 1: C → D → E → F
//! ```
//!
//! Team games split the seats into two halves; the winning half stays and the
//! losing half is replaced. A champion leaves through
//! [`Ledger::retire_champion`], after which the ladder can drain and be
//! finished like a lockstep queue.

use super::error::ArcadeError;
use super::game::{Game, GameMode};
use super::ids::{describe, GameId, Identity, QueueId, TicketId};
use super::ledger::Ledger;
use super::queue::{attached, SlotBatch, SlotReceipt};

fn require_ladder(game: &Game, operation: &'static str) -> Result<(), ArcadeError> {
    if game.mode.is_ladder() {
        Ok(())
    } else {
        Err(ArcadeError::ModeMismatch {
            mode: game.mode,
            operation,
        })
    }
}

fn require_mode(game: &Game, mode: GameMode, operation: &'static str) -> Result<(), ArcadeError> {
    if game.mode == mode {
        Ok(())
    } else {
        Err(ArcadeError::ModeMismatch {
            mode: game.mode,
            operation,
        })
    }
}

/// The seat whose current occupant is `ticket`.
fn seat_of(ledger: &Ledger, game: &Game, ticket: TicketId) -> Option<usize> {
    (0..game.slot_count()).find(|slot| {
        attached(ledger, game, *slot)
            .map(|q| q.current_id() == Some(ticket))
            .unwrap_or(false)
    })
}

impl Ledger {
    /// Attach a queue to every seat, seating `seats[i]` at seat `i`.
    pub fn init_ladder(
        &mut self,
        game_id: GameId,
        seats: &[Identity],
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_ladder(game, "ladder queues")?;
        ArcadeError::arity("seated players", game.slot_count(), seats.len())?;

        let mut batch = SlotBatch::new(game);
        for (slot, player) in seats.iter().enumerate() {
            batch.open(game, slot, player.clone())?;
        }
        Ok(batch.commit(self))
    }

    /// Queue `player` as a challenger for one seat.
    pub fn join_ladder(
        &mut self,
        game_id: GameId,
        slot: usize,
        player: Identity,
        expected_tail: TicketId,
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_ladder(game, "ladder queues")?;

        let mut batch = SlotBatch::new(game);
        batch.push(self, game, slot, expected_tail, player)?;
        Ok(batch.commit(self))
    }

    /// `winner` keeps their seat; every other seat, in seat order, releases
    /// the named loser and seats its next challenger.
    pub fn advance_ladder(
        &mut self,
        game_id: GameId,
        winner: TicketId,
        losers: &[TicketId],
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_mode(game, GameMode::KingOfHill, "single-winner advance")?;
        let seat = seat_of(self, game, winner)
            .ok_or_else(|| ArcadeError::stale("winner", winner, "no seat"))?;
        self.advance_subset(game_id, &[seat], losers)
    }

    /// The team whose current occupants are `winners` keeps its seats; the
    /// other team's seats release `losers` in seat order.
    pub fn advance_team_ladder(
        &mut self,
        game_id: GameId,
        winners: &[TicketId],
        losers: &[TicketId],
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_mode(game, GameMode::TeamKingOfHill, "team advance")?;
        let team_size = game.slot_count() / 2;
        ArcadeError::arity("winners", team_size, winners.len())?;

        let first = winners
            .first()
            .and_then(|w| seat_of(self, game, *w))
            .ok_or_else(|| {
                ArcadeError::stale("winning team", describe(winners.first().copied()), "no seat")
            })?;
        let team: Vec<usize> = if first < team_size {
            (0..team_size).collect()
        } else {
            (team_size..game.slot_count()).collect()
        };

        for (slot, winner) in team.iter().zip(winners) {
            let current = attached(self, game, *slot)?.current_id();
            if current != Some(*winner) {
                return Err(ArcadeError::stale(
                    "team member",
                    winner,
                    describe(current),
                ));
            }
        }
        self.advance_subset(game_id, &team, losers)
    }

    /// The champion at `champion`'s seat steps down; the seat moves on to its
    /// next challenger, or drains.
    pub fn retire_champion(
        &mut self,
        game_id: GameId,
        champion: TicketId,
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_ladder(game, "retiring a champion")?;
        let seat = seat_of(self, game, champion)
            .ok_or_else(|| ArcadeError::stale("champion", champion, "no seat"))?;

        let mut batch = SlotBatch::new(game);
        batch.pop(self, game, seat, champion, None)?;
        Ok(batch.commit(self))
    }

    /// Detach every seat's drained queue.
    pub fn finish_ladder(
        &mut self,
        game_id: GameId,
        expected_queues: &[QueueId],
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        require_ladder(game, "ladder queues")?;
        self.detach_all(game_id, expected_queues)
    }

    /// Keep the seats in `persist` and pop every other seat against
    /// `losers`, in seat order.
    fn advance_subset(
        &mut self,
        game_id: GameId,
        persist: &[usize],
        losers: &[TicketId],
    ) -> Result<SlotReceipt, ArcadeError> {
        let game = self.game(game_id)?;
        let challenged: Vec<usize> = (0..game.slot_count())
            .filter(|slot| !persist.contains(slot))
            .collect();
        ArcadeError::arity("losers", challenged.len(), losers.len())?;

        let mut batch = SlotBatch::new(game);
        for (slot, loser) in challenged.iter().zip(losers) {
            batch.pop(self, game, *slot, *loser, None)?;
        }
        Ok(batch.commit(self))
    }
}
