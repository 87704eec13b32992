//! Arcade Queue Library
//!
//! This crate keeps the catalog of arcade games and the queues of players
//! waiting to play them.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Game Directory** - A doubly-linked catalog of games, newest first,
//!   anchored by a registry and ending at a genesis game.
//!
//! - **Lockstep Queues** - Normal games seat one party across all of their
//!   1 to 4 seats; parties join at the tail and leave from the front together.
//!
//! - **Elimination Ladder** - King-of-the-hill games give each seat its own
//!   challenger queue. Winners keep their seat, losers are replaced.
//!
//! - **Leaderboards** - A top-3 score table per game.
//!
//! # Design Principles
//!
//! 1. **Compare and reject** - Every mutating call names the state it expects
//!    to replace. If the live state moved on, the call fails with a retryable
//!    error instead of guessing.
//!
//! 2. **All or nothing** - Multi-seat operations validate every seat before
//!    touching any of them.
//!
//! 3. **No I/O** - The ledger is an in-memory record store; persistence is a
//!    JSON snapshot the caller stores wherever it likes.
//!
//! # Example
//!
//! ```rust
//! use arcade_queue::{
//!     Arcade, ArcadeConfig, ContentRef, GameMode, Identity, Instruction, Outcome,
//! };
//!
//! let root = Identity::from("root");
//! let mut arcade = Arcade::new(ArcadeConfig::new(root.clone())).unwrap();
//!
//! let game = match arcade
//!     .execute(
//!         &root,
//!         Instruction::CreateGame {
//!             title: "Pong".to_string(),
//!             art_ref: ContentRef::from("art-hash"),
//!             code_ref: ContentRef::from("code-hash"),
//!             payout_wallet: root.clone(),
//!             max_players: 2,
//!             mode: GameMode::Normal,
//!         },
//!     )
//!     .unwrap()
//! {
//!     Outcome::GameCreated { game } => game,
//!     _ => unreachable!(),
//! };
//!
//! // Alice starts the queue on both seats.
//! let alice = Identity::from("alice");
//! arcade
//!     .execute(&alice, Instruction::InitQueue { game, player: alice.clone() })
//!     .unwrap();
//!
//! // Bob lines up behind her, naming the tails he saw.
//! let tails: Vec<_> = arcade
//!     .ledger()
//!     .slot_views(game)
//!     .unwrap()
//!     .iter()
//!     .filter_map(|v| v.tail)
//!     .collect();
//! let bob = Identity::from("bob");
//! arcade
//!     .execute(
//!         &bob,
//!         Instruction::JoinQueue { game, player: bob.clone(), expected_tails: tails },
//!     )
//!     .unwrap();
//!
//! assert!(arcade.ledger().slot_views(game).unwrap().iter().all(|v| v.waiting == 2));
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
