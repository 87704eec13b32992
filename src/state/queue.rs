//! Per-slot waiting queues and the batches that mutate them.
//!
//! Each attached slot owns a [`SlotQueue`]: a FIFO of [`Ticket`]s linked by
//! `next`, whose front is the current occupant and whose back is the tail.
//!
//! Engines never mutate queues directly. They validate every slot transition
//! of an operation into a [`SlotBatch`] first; only a fully validated batch
//! can be committed, and committing cannot fail. An operation therefore
//! either changes every slot it names or none of them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::error::ArcadeError;
use super::game::{Game, SlotState};
use super::ids::{describe, GameId, Identity, QueueId, TicketId};
use super::ledger::Ledger;

/// A waiting participant in one slot's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub owner: Identity,
    /// The ticket behind this one, `None` for the tail
    pub next: Option<TicketId>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

/// The queue attached to one seat of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotQueue {
    pub id: QueueId,

    /// Owning game
    pub game: GameId,

    /// Seat index within the owning game
    pub slot: usize,

    /// Front is the current occupant, back is the tail
    tickets: VecDeque<Ticket>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SlotQueue {
    fn new(id: QueueId, game: GameId, slot: usize) -> Self {
        Self {
            id,
            game,
            slot,
            tickets: VecDeque::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// The ticket currently holding the seat.
    pub fn current(&self) -> Option<&Ticket> {
        self.tickets.front()
    }

    pub fn current_id(&self) -> Option<TicketId> {
        self.current().map(|t| t.id)
    }

    /// The last ticket in line.
    pub fn tail(&self) -> Option<&Ticket> {
        self.tickets.back()
    }

    pub fn tail_id(&self) -> Option<TicketId> {
        self.tail().map(|t| t.id)
    }

    pub fn waiting_count(&self) -> usize {
        self.tickets.len()
    }

    /// Whether everyone has left; a drained queue only accepts finish.
    pub fn is_drained(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn ticket(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    /// Tickets from current to tail.
    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter()
    }

    /// How many tickets are ahead of a player's first ticket.
    pub fn position_of(&self, player: &Identity) -> Option<usize> {
        self.tickets.iter().position(|t| &t.owner == player)
    }

    /// Follow `next` links from the current occupant and count the tickets
    /// reached. Returns `None` if a link dangles, loops, or the walk does not
    /// end on the tail.
    pub fn chain_len(&self) -> Option<usize> {
        let mut cursor = self.current_id();
        let mut last = None;
        let mut count = 0;
        while let Some(id) = cursor {
            if count > self.tickets.len() {
                return None;
            }
            let ticket = self.ticket(id)?;
            count += 1;
            last = Some(id);
            cursor = ticket.next;
        }
        (last == self.tail_id()).then_some(count)
    }

    pub fn view(&self) -> SlotView {
        SlotView {
            slot: self.slot,
            queue: self.id,
            current: self.current_id(),
            tail: self.tail_id(),
            waiting: self.waiting_count(),
        }
    }

    /// Reject unless the tail is the one the caller last saw.
    pub fn check_tail(&self, expected: TicketId) -> Result<(), ArcadeError> {
        match self.tail_id() {
            None => Err(ArcadeError::SlotDrained { slot: self.slot }),
            Some(tail) if tail == expected => Ok(()),
            Some(tail) => Err(ArcadeError::stale("queue tail", expected, tail)),
        }
    }

    /// Reject unless the current occupant, and optionally the ticket behind
    /// it, are the ones the caller last saw.
    pub fn check_current(
        &self,
        expected: TicketId,
        expected_next: Option<Option<TicketId>>,
    ) -> Result<(), ArcadeError> {
        let current = self
            .current()
            .ok_or(ArcadeError::EmptySlotAdvance { slot: self.slot })?;
        if current.id != expected {
            return Err(ArcadeError::stale("current occupant", expected, current.id));
        }
        match expected_next {
            Some(next) if next != current.next => Err(ArcadeError::stale(
                "next occupant",
                describe(next),
                describe(current.next),
            )),
            _ => Ok(()),
        }
    }

    fn push_back(&mut self, id: TicketId, owner: Identity) {
        if let Some(tail) = self.tickets.back_mut() {
            tail.next = Some(id);
        }
        self.tickets.push_back(Ticket {
            id,
            owner,
            next: None,
            joined_at: chrono::Utc::now(),
        });
    }

    fn pop_front(&mut self) -> Option<Ticket> {
        self.tickets.pop_front()
    }
}

/// Snapshot of one slot after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub slot: usize,
    pub queue: QueueId,
    pub current: Option<TicketId>,
    pub tail: Option<TicketId>,
    pub waiting: usize,
}

/// What a committed batch did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotReceipt {
    /// Tickets issued, in slot order
    pub tickets: Vec<TicketId>,
    /// Queues detached and removed
    pub closed: Vec<QueueId>,
    /// Surviving slots touched by the batch, after the change
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Clone)]
enum SlotOp {
    Open { owner: Identity },
    Push { queue: QueueId, owner: Identity },
    Pop { queue: QueueId },
    Close { queue: QueueId },
}

/// A set of validated single-slot transitions on one game.
#[derive(Debug)]
#[must_use = "a batch does nothing until committed"]
pub struct SlotBatch {
    game: GameId,
    steps: Vec<(usize, SlotOp)>,
}

impl SlotBatch {
    pub(crate) fn new(game: &Game) -> Self {
        Self {
            game: game.id,
            steps: Vec::with_capacity(game.slot_count()),
        }
    }

    /// Attach a fresh queue holding one ticket for `owner`.
    pub(crate) fn open(
        &mut self,
        game: &Game,
        slot: usize,
        owner: Identity,
    ) -> Result<(), ArcadeError> {
        match slot_state(game, slot)? {
            SlotState::Empty => {}
            SlotState::Active(queue) => {
                return Err(ArcadeError::SlotOccupiedConflict { slot, queue });
            }
        }
        self.steps.push((slot, SlotOp::Open { owner }));
        Ok(())
    }

    /// Append `owner` behind `expected_tail`.
    pub(crate) fn push(
        &mut self,
        ledger: &Ledger,
        game: &Game,
        slot: usize,
        expected_tail: TicketId,
        owner: Identity,
    ) -> Result<(), ArcadeError> {
        let queue = attached(ledger, game, slot)?;
        queue.check_tail(expected_tail)?;
        self.steps.push((
            slot,
            SlotOp::Push {
                queue: queue.id,
                owner,
            },
        ));
        Ok(())
    }

    /// Release `expected_current` from its seat.
    pub(crate) fn pop(
        &mut self,
        ledger: &Ledger,
        game: &Game,
        slot: usize,
        expected_current: TicketId,
        expected_next: Option<Option<TicketId>>,
    ) -> Result<(), ArcadeError> {
        let queue = attached(ledger, game, slot)?;
        queue.check_current(expected_current, expected_next)?;
        self.steps.push((slot, SlotOp::Pop { queue: queue.id }));
        Ok(())
    }

    /// Detach a drained queue.
    pub(crate) fn close(
        &mut self,
        ledger: &Ledger,
        game: &Game,
        slot: usize,
        expected_queue: QueueId,
    ) -> Result<(), ArcadeError> {
        let queue = attached(ledger, game, slot)?;
        if queue.id != expected_queue {
            return Err(ArcadeError::stale("slot queue", expected_queue, queue.id));
        }
        if !queue.is_drained() {
            return Err(ArcadeError::PrematureFinish {
                slot,
                waiting: queue.waiting_count(),
            });
        }
        self.steps.push((slot, SlotOp::Close { queue: queue.id }));
        Ok(())
    }

    /// Apply every step. Validation already ran against the same ledger
    /// borrow, so nothing here can be rejected.
    pub(crate) fn commit(self, ledger: &mut Ledger) -> SlotReceipt {
        let mut receipt = SlotReceipt::default();
        let mut touched = Vec::with_capacity(self.steps.len());

        for (slot, op) in self.steps {
            match op {
                SlotOp::Open { owner } => {
                    let queue_id = QueueId(ledger.allocate());
                    let ticket_id = TicketId(ledger.allocate());
                    let mut queue = SlotQueue::new(queue_id, self.game, slot);
                    queue.push_back(ticket_id, owner);
                    ledger.queues.insert(queue_id, queue);
                    if let Some(game) = ledger.games.get_mut(&self.game) {
                        game.slots[slot] = SlotState::Active(queue_id);
                    }
                    tracing::debug!(game = %self.game, slot, queue = %queue_id, "queue attached");
                    receipt.tickets.push(ticket_id);
                    touched.push(queue_id);
                }
                SlotOp::Push { queue, owner } => {
                    let ticket_id = TicketId(ledger.allocate());
                    if let Some(q) = ledger.queues.get_mut(&queue) {
                        q.push_back(ticket_id, owner);
                    }
                    tracing::debug!(game = %self.game, slot, ticket = %ticket_id, "ticket queued");
                    receipt.tickets.push(ticket_id);
                    touched.push(queue);
                }
                SlotOp::Pop { queue } => {
                    if let Some(q) = ledger.queues.get_mut(&queue) {
                        let left = q.pop_front().map(|t| t.id);
                        tracing::debug!(
                            game = %self.game,
                            slot,
                            left = %describe(left),
                            current = %describe(q.current_id()),
                            "slot advanced"
                        );
                    }
                    touched.push(queue);
                }
                SlotOp::Close { queue } => {
                    ledger.queues.remove(&queue);
                    if let Some(game) = ledger.games.get_mut(&self.game) {
                        game.slots[slot] = SlotState::Empty;
                    }
                    tracing::debug!(game = %self.game, slot, queue = %queue, "queue detached");
                    receipt.closed.push(queue);
                }
            }
        }

        receipt.slots = touched
            .iter()
            .filter_map(|id| ledger.queues.get(id))
            .map(SlotQueue::view)
            .collect();
        receipt
    }
}

fn slot_state(game: &Game, slot: usize) -> Result<SlotState, ArcadeError> {
    game.slot(slot).ok_or(ArcadeError::SlotOutOfRange {
        slot,
        max_players: game.max_players,
    })
}

/// The queue attached at `slot`, checked to belong there.
pub(crate) fn attached<'a>(
    ledger: &'a Ledger,
    game: &Game,
    slot: usize,
) -> Result<&'a SlotQueue, ArcadeError> {
    let queue_id = slot_state(game, slot)?
        .queue()
        .ok_or(ArcadeError::SlotDetached { slot })?;
    let queue = ledger.queue(queue_id)?;
    if queue.game != game.id || queue.slot != slot {
        return Err(ArcadeError::UnknownQueue(queue_id));
    }
    Ok(queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn queue_with(owners: &[&str]) -> SlotQueue {
        let mut queue = SlotQueue::new(QueueId(100), GameId(1), 0);
        for (i, owner) in owners.iter().enumerate() {
            queue.push_back(TicketId(i as u64 + 1), Identity::from(*owner));
        }
        queue
    }

    #[test]
    fn test_empty_queue_sentinels() {
        let queue = queue_with(&[]);
        assert!(queue.is_drained());
        assert_eq!(queue.current_id(), None);
        assert_eq!(queue.tail_id(), None);
        assert_eq!(queue.chain_len(), Some(0));
    }

    #[test]
    fn test_single_ticket_is_current_and_tail() {
        let queue = queue_with(&["alice"]);
        assert_eq!(queue.current_id(), Some(TicketId(1)));
        assert_eq!(queue.tail_id(), Some(TicketId(1)));
        assert_eq!(queue.current().unwrap().next, None);
        assert_eq!(queue.chain_len(), Some(1));
    }

    #[test]
    fn test_links_follow_push_order() {
        let queue = queue_with(&["alice", "bob", "carol"]);
        let links: Vec<_> = queue.tickets().map(|t| t.next).collect();
        assert_eq!(links, vec![Some(TicketId(2)), Some(TicketId(3)), None]);
        assert_eq!(queue.chain_len(), Some(3));
        assert_eq!(queue.position_of(&Identity::from("carol")), Some(2));
        assert_eq!(queue.position_of(&Identity::from("dave")), None);
    }

    #[test]
    fn test_pop_moves_current_to_next() {
        let mut queue = queue_with(&["alice", "bob"]);
        let left = queue.pop_front().unwrap();
        assert_eq!(left.owner, Identity::from("alice"));
        assert_eq!(queue.current_id(), Some(TicketId(2)));
        assert_eq!(queue.tail_id(), Some(TicketId(2)));

        queue.pop_front();
        assert!(queue.is_drained());
        assert_eq!(queue.tail_id(), None);
    }

    #[test]
    fn test_check_tail() {
        let queue = queue_with(&["alice", "bob"]);
        assert!(queue.check_tail(TicketId(2)).is_ok());
        assert!(matches!(
            queue.check_tail(TicketId(1)),
            Err(ArcadeError::StaleReference { .. })
        ));
        assert_eq!(
            queue_with(&[]).check_tail(TicketId(1)),
            Err(ArcadeError::SlotDrained { slot: 0 })
        );
    }

    #[test]
    fn test_check_current() {
        let queue = queue_with(&["alice", "bob"]);
        assert!(queue.check_current(TicketId(1), None).is_ok());
        assert!(queue.check_current(TicketId(1), Some(Some(TicketId(2)))).is_ok());
        assert!(matches!(
            queue.check_current(TicketId(1), Some(None)),
            Err(ArcadeError::StaleReference { what: "next occupant", .. })
        ));
        assert!(matches!(
            queue.check_current(TicketId(2), None),
            Err(ArcadeError::StaleReference { what: "current occupant", .. })
        ));
        assert_eq!(
            queue_with(&[]).check_current(TicketId(1), None),
            Err(ArcadeError::EmptySlotAdvance { slot: 0 })
        );
    }

    #[test]
    fn test_chain_len_detects_broken_link() {
        let mut queue = queue_with(&["alice", "bob"]);
        queue.tickets[0].next = Some(TicketId(42));
        assert_eq!(queue.chain_len(), None);
    }
}
