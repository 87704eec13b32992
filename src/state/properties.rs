//! Property tests over random operation sequences.

use proptest::prelude::*;

use super::error::ArcadeError;
use super::game::{ContentRef, GameMode, NewGame};
use super::ids::{GameId, Identity, TicketId};
use super::leaderboard::{Leaderboard, LeaderboardEntry, LEADERBOARD_RANKS};
use super::ledger::Ledger;

fn ledger() -> Ledger {
    Ledger::new(Identity::from("root"), "genesis")
}

fn new_game(max_players: u8, mode: GameMode) -> NewGame {
    NewGame {
        title: "prop".to_string(),
        art_ref: ContentRef::from("art"),
        code_ref: ContentRef::from("code"),
        payout_wallet: Identity::from("payout"),
        owner: Identity::from("root"),
        max_players,
        mode,
    }
}

fn newest_first(ledger: &Ledger) -> Vec<GameId> {
    ledger.games_newest_first().map(|g| g.id).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Generators
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum DirectoryOp {
    Create,
    DeleteHead,
    DeleteInterior(usize),
}

fn arb_directory_op() -> impl Strategy<Value = DirectoryOp> {
    prop_oneof![
        3 => Just(DirectoryOp::Create),
        1 => Just(DirectoryOp::DeleteHead),
        1 => any::<usize>().prop_map(DirectoryOp::DeleteInterior),
    ]
}

#[derive(Debug, Clone)]
enum LadderOp {
    Join(usize),
    Advance(usize),
}

fn arb_ladder_op() -> impl Strategy<Value = LadderOp> {
    prop_oneof![
        2 => (0usize..4).prop_map(LadderOp::Join),
        1 => (0usize..4).prop_map(LadderOp::Advance),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    /// The directory stays a single acyclic list from head to genesis.
    #[test]
    fn prop_directory_stays_linked(ops in prop::collection::vec(arb_directory_op(), 0..40)) {
        let mut ledger = ledger();
        let genesis = ledger.registry().genesis_game;

        for op in ops {
            let order = newest_first(&ledger);
            match op {
                DirectoryOp::Create => {
                    let previous = ledger.registry().most_recent_game;
                    let id = ledger.create_game(new_game(1, GameMode::Normal)).unwrap();
                    prop_assert_eq!(ledger.game(id).unwrap().older_game, Some(previous));
                }
                DirectoryOp::DeleteHead => {
                    let head = order[0];
                    match ledger.game(head).unwrap().older_game {
                        Some(older) => {
                            ledger.delete_most_recent_game(head, older).unwrap();
                        }
                        None => {
                            prop_assert!(ledger.delete_most_recent_game(head, head).is_err());
                        }
                    }
                }
                DirectoryOp::DeleteInterior(pick) => {
                    if order.len() >= 3 {
                        let i = pick % (order.len() - 2) + 1;
                        ledger.delete_game(order[i], order[i - 1], order[i + 1]).unwrap();
                    }
                }
            }

            prop_assert!(ledger.audit().is_empty(), "{:?}", ledger.audit());
            let order = newest_first(&ledger);
            prop_assert_eq!(order.len(), ledger.game_count());
            prop_assert_eq!(order.last().copied(), Some(genesis));
            prop_assert_eq!(order[0], ledger.registry().most_recent_game);
        }
    }

    /// Every seat of a normal game holds the same number of parties, and
    /// every ticket chain matches its waiting count.
    #[test]
    fn prop_lockstep_slots_agree(
        max_players in 1u8..=4,
        ops in prop::collection::vec(any::<bool>(), 0..30),
    ) {
        let mut ledger = ledger();
        let game = ledger.create_game(new_game(max_players, GameMode::Normal)).unwrap();
        ledger.init_queue(game, Identity::from("p0")).unwrap();
        let mut waiting = 1usize;

        for (step, join) in ops.into_iter().enumerate() {
            let views = ledger.slot_views(game).unwrap();
            if join {
                let tails: Vec<TicketId> = views.iter().filter_map(|v| v.tail).collect();
                let result = ledger.join_queue(game, Identity::new(format!("p{}", step + 1)), &tails);
                if waiting == 0 {
                    prop_assert!(result.is_err());
                } else {
                    result.unwrap();
                    waiting += 1;
                }
            } else if waiting == 0 {
                let current = vec![TicketId(0); max_players as usize];
                let next = vec![None; max_players as usize];
                prop_assert_eq!(
                    ledger.advance_queue(game, &current, &next),
                    Err(ArcadeError::EmptySlotAdvance { slot: 0 })
                );
            } else {
                let mut current = Vec::new();
                let mut next = Vec::new();
                for v in &views {
                    let queue = ledger.queue(v.queue).unwrap();
                    let front = queue.current().unwrap();
                    current.push(front.id);
                    next.push(front.next);
                }
                ledger.advance_queue(game, &current, &next).unwrap();
                waiting -= 1;
            }

            let views = ledger.slot_views(game).unwrap();
            prop_assert_eq!(views.len(), max_players as usize);
            for v in &views {
                prop_assert_eq!(v.waiting, waiting);
                prop_assert_eq!(v.current.is_none(), waiting == 0);
                prop_assert_eq!(v.tail.is_none(), waiting == 0);
            }
            prop_assert!(ledger.audit().is_empty(), "{:?}", ledger.audit());
        }
    }

    /// The winner's seat never changes on advance; every loser's seat moves
    /// to the ticket that was behind the loser.
    #[test]
    fn prop_ladder_winner_persists(
        max_players in 2u8..=4,
        ops in prop::collection::vec(arb_ladder_op(), 0..40),
    ) {
        let mut ledger = ledger();
        let n = max_players as usize;
        let game = ledger.create_game(new_game(max_players, GameMode::KingOfHill)).unwrap();
        let seats: Vec<Identity> = (0..n).map(|i| Identity::new(format!("seat{}", i))).collect();
        ledger.init_ladder(game, &seats).unwrap();

        for (step, op) in ops.into_iter().enumerate() {
            let views = ledger.slot_views(game).unwrap();
            match op {
                LadderOp::Join(slot) => {
                    let slot = slot % n;
                    let player = Identity::new(format!("challenger{}", step));
                    match views[slot].tail {
                        Some(tail) => {
                            ledger.join_ladder(game, slot, player, tail).unwrap();
                        }
                        None => {
                            prop_assert_eq!(
                                ledger.join_ladder(game, slot, player, TicketId(0)),
                                Err(ArcadeError::SlotDrained { slot })
                            );
                        }
                    }
                }
                LadderOp::Advance(winner_slot) => {
                    let winner_slot = winner_slot % n;
                    let Some(winner) = views[winner_slot].current else {
                        continue;
                    };
                    let others: Vec<usize> = (0..n).filter(|s| *s != winner_slot).collect();
                    if others.iter().any(|s| views[*s].current.is_none()) {
                        let losers = vec![TicketId(0); n - 1];
                        prop_assert!(ledger.advance_ladder(game, winner, &losers).is_err());
                        prop_assert_eq!(ledger.slot_views(game).unwrap(), views);
                        continue;
                    }

                    let mut losers = Vec::new();
                    let mut expected_next = Vec::new();
                    for s in &others {
                        let queue = ledger.queue(views[*s].queue).unwrap();
                        let front = queue.current().unwrap();
                        losers.push(front.id);
                        expected_next.push(front.next);
                    }
                    ledger.advance_ladder(game, winner, &losers).unwrap();

                    let after = ledger.slot_views(game).unwrap();
                    prop_assert_eq!(after[winner_slot], views[winner_slot]);
                    for (s, next) in others.iter().zip(expected_next) {
                        prop_assert_eq!(after[*s].current, next);
                        prop_assert_eq!(after[*s].waiting, views[*s].waiting - 1);
                    }
                }
            }
            prop_assert!(ledger.audit().is_empty(), "{:?}", ledger.audit());
        }
    }

    /// The board always holds the best three scores, earlier submissions
    /// winning ties.
    #[test]
    fn prop_leaderboard_is_top_three(scores in prop::collection::vec(0u64..50, 0..25)) {
        let mut board = Leaderboard::new();
        for (i, score) in scores.iter().enumerate() {
            board.submit(LeaderboardEntry::new(format!("p{}", i), Identity::from("w"), *score));
            prop_assert!(board.is_well_ordered());
        }

        let mut ranked: Vec<(usize, u64)> = scores.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let expected: Vec<String> = ranked
            .iter()
            .take(LEADERBOARD_RANKS)
            .map(|(i, _)| format!("p{}", i))
            .collect();
        let actual: Vec<String> = board.entries().map(|e| e.name.clone()).collect();
        prop_assert_eq!(actual, expected);
    }
}
