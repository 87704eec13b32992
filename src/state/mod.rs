//! State management module for the arcade.
//!
//! This module provides the record types, the engines that mutate them and
//! the [`Arcade`] front door that authorizes and applies instructions:
//!
//! - `ids` - Record and external identities
//! - `ledger` - In-memory record store and invariant audit
//! - `directory` - Doubly-linked game catalog
//! - `game` - Game records and slot states
//! - `queue` - Per-slot ticket queues and validated slot batches
//! - `lockstep` - Normal-mode queues (all seats move together)
//! - `ladder` - King-of-the-hill queues (winner stays, losers are replaced)
//! - `leaderboard` - Top-3 score table
//! - `instruction` - Operation surface
//! - `config` - Arcade configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Arcade                                      │
//! │                                                                          │
//! │   signer + Instruction ──▶ authorize ──▶ engine ──▶ Outcome              │
//! │                                                                          │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │                            Ledger                                  │  │
//! │  │                                                                    │  │
//! │  │  Registry ──▶ head game ─older─▶ ... ─older─▶ genesis              │  │
//! │  │                                                                    │  │
//! │  │  game_id  → Game { slots: [Empty | Active(queue_id)], leaderboard }│  │
//! │  │  queue_id → SlotQueue { current → ... → tail }                     │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Authorization
//!
//! An *operator* of a game is the registry authority or the game's owner.
//!
//! | Instruction | Signer |
//! |---|---|
//! | create | authority (anyone with open publishing) |
//! | delete | operator |
//! | init / join | the player being seated (every seat, for a ladder), or an operator |
//! | advance / finish | operator |
//! | retire | operator, or the retiring champion |
//! | leaderboard | operator |

pub mod config;
pub mod directory;
pub mod error;
pub mod game;
pub mod ids;
pub mod instruction;
pub mod ladder;
pub mod leaderboard;
pub mod ledger;
pub mod lockstep;
pub mod queue;

#[cfg(test)]
mod properties;

// Re-export commonly used types
pub use config::ArcadeConfig;
pub use error::ArcadeError;
pub use game::{ContentRef, Game, GameMode, NewGame, SlotState, MAX_SLOTS};
pub use ids::{GameId, Identity, QueueId, TicketId};
pub use instruction::{Instruction, Outcome};
pub use leaderboard::{Leaderboard, LeaderboardEntry, LEADERBOARD_RANKS};
pub use ledger::{Ledger, Registry};
pub use queue::{SlotQueue, SlotReceipt, SlotView, Ticket};

/// The arcade: configuration plus the ledger it governs.
#[derive(Debug, Clone)]
pub struct Arcade {
    config: ArcadeConfig,
    ledger: Ledger,
}

impl Arcade {
    pub fn new(config: ArcadeConfig) -> Result<Self, ArcadeError> {
        config.validate()?;
        let ledger = Ledger::new(config.authority.clone(), config.genesis_title.clone());
        Ok(Self { config, ledger })
    }

    /// Rebuild an arcade from a [`Arcade::snapshot`].
    pub fn restore(config: ArcadeConfig, snapshot: &str) -> Result<Self, ArcadeError> {
        config.validate()?;
        let ledger = Ledger::from_json(snapshot)?;
        if !ledger.is_authority(&config.authority) {
            return Err(ArcadeError::InvalidSnapshot(format!(
                "snapshot authority {} does not match config",
                ledger.registry().authority
            )));
        }
        Ok(Self { config, ledger })
    }

    pub fn snapshot(&self) -> Result<String, ArcadeError> {
        self.ledger.to_json()
    }

    pub fn config(&self) -> &ArcadeConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Authorize and apply one instruction. On error nothing has changed.
    pub fn execute(
        &mut self,
        signer: &Identity,
        instruction: Instruction,
    ) -> Result<Outcome, ArcadeError> {
        let op = instruction.name();
        let game = instruction.game();
        match self.apply(signer, instruction) {
            Ok(outcome) => {
                tracing::info!(op, signer = %signer, game = ?game, "instruction applied");
                Ok(outcome)
            }
            Err(err) => {
                tracing::debug!(
                    op,
                    signer = %signer,
                    game = ?game,
                    error = %err,
                    retryable = err.is_retryable(),
                    "instruction rejected"
                );
                Err(err)
            }
        }
    }

    fn apply(&mut self, signer: &Identity, instruction: Instruction) -> Result<Outcome, ArcadeError> {
        use Instruction::*;

        match instruction {
            CreateGame {
                title,
                art_ref,
                code_ref,
                payout_wallet,
                max_players,
                mode,
            } => {
                if !self.config.open_publishing && !self.ledger.is_authority(signer) {
                    return Err(unauthorized(signer, "create games"));
                }
                self.config.check_title(&title)?;
                let game = self.ledger.create_game(NewGame {
                    title,
                    art_ref,
                    code_ref,
                    payout_wallet,
                    owner: signer.clone(),
                    max_players,
                    mode,
                })?;
                Ok(Outcome::GameCreated { game })
            }

            DeleteMostRecentGame { game, older_game } => {
                self.require_operator(signer, game, "delete this game")?;
                let removed = self.ledger.delete_most_recent_game(game, older_game)?;
                Ok(deleted(&removed))
            }

            DeleteGame {
                game,
                younger_game,
                older_game,
            } => {
                self.require_operator(signer, game, "delete this game")?;
                let removed = self.ledger.delete_game(game, younger_game, older_game)?;
                Ok(deleted(&removed))
            }

            InitQueue { game, player } => {
                self.require_player(signer, game, &player)?;
                Ok(queued(self.ledger.init_queue(game, player)?))
            }

            InitLadder { game, seats } => {
                if seats.is_empty() || seats.iter().any(|seat| seat != signer) {
                    self.require_operator(signer, game, "seat other players")?;
                }
                Ok(queued(self.ledger.init_ladder(game, &seats)?))
            }

            JoinQueue {
                game,
                player,
                expected_tails,
            } => {
                self.require_player(signer, game, &player)?;
                Ok(queued(self.ledger.join_queue(game, player, &expected_tails)?))
            }

            JoinLadder {
                game,
                slot,
                player,
                expected_tail,
            } => {
                self.require_player(signer, game, &player)?;
                Ok(queued(self.ledger.join_ladder(game, slot, player, expected_tail)?))
            }

            AdvanceQueue {
                game,
                expected_current,
                expected_next,
            } => {
                self.require_operator(signer, game, "advance queues")?;
                let receipt = self
                    .ledger
                    .advance_queue(game, &expected_current, &expected_next)?;
                Ok(advanced(receipt))
            }

            AdvanceLadder {
                game,
                winner,
                losers,
            } => {
                self.require_operator(signer, game, "advance queues")?;
                Ok(advanced(self.ledger.advance_ladder(game, winner, &losers)?))
            }

            AdvanceTeamLadder {
                game,
                winners,
                losers,
            } => {
                self.require_operator(signer, game, "advance queues")?;
                Ok(advanced(self.ledger.advance_team_ladder(game, &winners, &losers)?))
            }

            RetireChampion { game, champion } => {
                let is_champion = self
                    .ledger
                    .occupant(game, champion)
                    .is_some_and(|t| &t.owner == signer);
                if !is_champion {
                    self.require_operator(signer, game, "retire another player")?;
                }
                Ok(advanced(self.ledger.retire_champion(game, champion)?))
            }

            FinishQueue { game, queues } => {
                self.require_operator(signer, game, "finish queues")?;
                let receipt = self.ledger.finish_queue(game, &queues)?;
                Ok(Outcome::Finished {
                    queues: receipt.closed,
                })
            }

            FinishLadder { game, queues } => {
                self.require_operator(signer, game, "finish queues")?;
                let receipt = self.ledger.finish_ladder(game, &queues)?;
                Ok(Outcome::Finished {
                    queues: receipt.closed,
                })
            }

            UpdateLeaderboard {
                game,
                name,
                score,
                wallet,
            } => {
                self.require_operator(signer, game, "post scores")?;
                self.config.check_name(&name)?;
                let rank = self.ledger.update_leaderboard(game, name, score, wallet)?;
                Ok(Outcome::LeaderboardUpdated { rank })
            }
        }
    }

    /// Whether `signer` is the authority or the owner of `game`.
    pub fn is_operator(&self, signer: &Identity, game: GameId) -> Result<bool, ArcadeError> {
        Ok(self.ledger.is_authority(signer) || self.ledger.game(game)?.is_owner(signer))
    }

    fn require_operator(
        &self,
        signer: &Identity,
        game: GameId,
        action: &'static str,
    ) -> Result<(), ArcadeError> {
        if self.is_operator(signer, game)? {
            Ok(())
        } else {
            Err(unauthorized(signer, action))
        }
    }

    fn require_player(
        &self,
        signer: &Identity,
        game: GameId,
        player: &Identity,
    ) -> Result<(), ArcadeError> {
        if signer == player {
            // Still surface an unknown game before touching queues.
            self.ledger.game(game)?;
            Ok(())
        } else {
            self.require_operator(signer, game, "queue other players")
        }
    }
}

fn unauthorized(signer: &Identity, action: &'static str) -> ArcadeError {
    ArcadeError::Unauthorized {
        signer: signer.clone(),
        action,
    }
}

fn deleted(game: &Game) -> Outcome {
    Outcome::GameDeleted {
        game: game.id,
        queues: game.attached_queues().map(|(_, q)| q).collect(),
    }
}

fn queued(receipt: SlotReceipt) -> Outcome {
    Outcome::Queued {
        tickets: receipt.tickets,
        slots: receipt.slots,
    }
}

fn advanced(receipt: SlotReceipt) -> Outcome {
    Outcome::Advanced {
        slots: receipt.slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root() -> Identity {
        Identity::from("root")
    }

    fn arcade() -> Arcade {
        Arcade::new(ArcadeConfig::new(root())).unwrap()
    }

    fn create(arcade: &mut Arcade, signer: &Identity, max_players: u8, mode: GameMode) -> GameId {
        let outcome = arcade
            .execute(
                signer,
                Instruction::CreateGame {
                    title: "Galaga".to_string(),
                    art_ref: ContentRef::from("art"),
                    code_ref: ContentRef::from("code"),
                    payout_wallet: Identity::from("payout"),
                    max_players,
                    mode,
                },
            )
            .unwrap();
        match outcome {
            Outcome::GameCreated { game } => game,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn tickets(outcome: Outcome) -> Vec<TicketId> {
        match outcome {
            Outcome::Queued { tickets, .. } => tickets,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_create_requires_authority() {
        let mut arcade = arcade();
        let err = arcade
            .execute(
                &Identity::from("mallory"),
                Instruction::CreateGame {
                    title: "x".to_string(),
                    art_ref: ContentRef::from("a"),
                    code_ref: ContentRef::from("c"),
                    payout_wallet: Identity::from("w"),
                    max_players: 1,
                    mode: GameMode::Normal,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ArcadeError::Unauthorized { .. }));
        assert_eq!(arcade.ledger().game_count(), 1);
    }

    #[test]
    fn test_open_publishing_makes_signer_owner() {
        let config = ArcadeConfig {
            open_publishing: true,
            ..ArcadeConfig::new(root())
        };
        let mut arcade = Arcade::new(config).unwrap();
        let dev = Identity::from("dev");
        let game = create(&mut arcade, &dev, 2, GameMode::Normal);
        assert!(arcade.ledger().game(game).unwrap().is_owner(&dev));
        assert!(arcade.is_operator(&dev, game).unwrap());
        assert!(arcade.is_operator(&root(), game).unwrap());
        assert!(!arcade.is_operator(&Identity::from("other"), game).unwrap());
    }

    #[test]
    fn test_title_limit() {
        let mut arcade = arcade();
        let err = arcade
            .execute(
                &root(),
                Instruction::CreateGame {
                    title: "x".repeat(100),
                    art_ref: ContentRef::from("a"),
                    code_ref: ContentRef::from("c"),
                    payout_wallet: Identity::from("w"),
                    max_players: 1,
                    mode: GameMode::Normal,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ArcadeError::TooLong { field: "title", .. }));
    }

    #[test]
    fn test_players_queue_themselves() {
        let mut arcade = arcade();
        let game = create(&mut arcade, &root(), 1, GameMode::Normal);
        let alice = Identity::from("alice");
        let bob = Identity::from("bob");

        let a = tickets(
            arcade
                .execute(
                    &alice,
                    Instruction::InitQueue {
                        game,
                        player: alice.clone(),
                    },
                )
                .unwrap(),
        );

        // Alice cannot queue Bob.
        let err = arcade
            .execute(
                &alice,
                Instruction::JoinQueue {
                    game,
                    player: bob.clone(),
                    expected_tails: a.clone(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ArcadeError::Unauthorized { .. }));

        let b = tickets(
            arcade
                .execute(
                    &bob,
                    Instruction::JoinQueue {
                        game,
                        player: bob.clone(),
                        expected_tails: a.clone(),
                    },
                )
                .unwrap(),
        );

        // Only an operator reports results.
        let advance = Instruction::AdvanceQueue {
            game,
            expected_current: a.clone(),
            expected_next: vec![Some(b[0])],
        };
        assert!(matches!(
            arcade.execute(&bob, advance.clone()),
            Err(ArcadeError::Unauthorized { .. })
        ));
        let outcome = arcade.execute(&root(), advance).unwrap();
        match outcome {
            Outcome::Advanced { slots } => {
                assert_eq!(slots[0].current, Some(b[0]));
                assert_eq!(slots[0].waiting, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_champion_may_retire_themself() {
        let mut arcade = arcade();
        let game = create(&mut arcade, &root(), 2, GameMode::KingOfHill);
        let alice = Identity::from("alice");
        let bob = Identity::from("bob");
        let seated = tickets(
            arcade
                .execute(
                    &root(),
                    Instruction::InitLadder {
                        game,
                        seats: vec![alice.clone(), bob.clone()],
                    },
                )
                .unwrap(),
        );

        assert!(matches!(
            arcade.execute(
                &bob,
                Instruction::RetireChampion {
                    game,
                    champion: seated[0]
                }
            ),
            Err(ArcadeError::Unauthorized { .. })
        ));
        arcade
            .execute(
                &alice,
                Instruction::RetireChampion {
                    game,
                    champion: seated[0],
                },
            )
            .unwrap();
        assert!(arcade.ledger().slot_queue(game, 0).unwrap().is_drained());
    }

    #[test]
    fn test_ladder_init_by_outsider_rejected() {
        let mut arcade = arcade();
        let game = create(&mut arcade, &root(), 2, GameMode::KingOfHill);
        let err = arcade
            .execute(
                &Identity::from("mallory"),
                Instruction::InitLadder {
                    game,
                    seats: vec![Identity::from("a"), Identity::from("b")],
                },
            )
            .unwrap_err();
        assert!(matches!(err, ArcadeError::Unauthorized { .. }));
    }

    #[test]
    fn test_ladder_init_cannot_seat_others() {
        let mut arcade = arcade();
        let game = create(&mut arcade, &root(), 2, GameMode::KingOfHill);
        let mallory = Identity::from("mallory");
        let err = arcade
            .execute(
                &mallory,
                Instruction::InitLadder {
                    game,
                    seats: vec![mallory.clone(), Identity::from("victim")],
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            ArcadeError::Unauthorized {
                signer: mallory.clone(),
                action: "seat other players",
            }
        );
        assert!(!arcade.ledger().game(game).unwrap().has_active_queue());

        // Filling every seat with themself needs no operator.
        let seated = tickets(
            arcade
                .execute(
                    &mallory,
                    Instruction::InitLadder {
                        game,
                        seats: vec![mallory.clone(), mallory.clone()],
                    },
                )
                .unwrap(),
        );
        assert_eq!(seated.len(), 2);
    }

    #[test]
    fn test_leaderboard_through_execute() {
        let mut arcade = arcade();
        let game = create(&mut arcade, &root(), 1, GameMode::Normal);
        for (name, score) in [("a", 30), ("b", 2048), ("c", 75)] {
            arcade
                .execute(
                    &root(),
                    Instruction::UpdateLeaderboard {
                        game,
                        name: name.to_string(),
                        score,
                        wallet: Identity::new(format!("{}-wallet", name)),
                    },
                )
                .unwrap();
        }
        let board = &arcade.ledger().game(game).unwrap().leaderboard;
        let scores: Vec<u64> = board.entries().map(|e| e.score).collect();
        assert_eq!(scores, vec![2048, 75, 30]);

        let outcome = arcade
            .execute(
                &root(),
                Instruction::UpdateLeaderboard {
                    game,
                    name: "d".to_string(),
                    score: 1,
                    wallet: Identity::from("d-wallet"),
                },
            )
            .unwrap();
        assert_eq!(outcome, Outcome::LeaderboardUpdated { rank: None });
    }

    #[test]
    fn test_delete_removes_attached_queues() {
        let mut arcade = arcade();
        let genesis = arcade.ledger().registry().genesis_game;
        let game = create(&mut arcade, &root(), 2, GameMode::Normal);
        arcade
            .execute(
                &root(),
                Instruction::InitQueue {
                    game,
                    player: Identity::from("alice"),
                },
            )
            .unwrap();
        assert_eq!(arcade.ledger().queue_count(), 2);

        let outcome = arcade
            .execute(
                &root(),
                Instruction::DeleteMostRecentGame {
                    game,
                    older_game: genesis,
                },
            )
            .unwrap();
        match outcome {
            Outcome::GameDeleted { game: deleted, queues } => {
                assert_eq!(deleted, game);
                assert_eq!(queues.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(arcade.ledger().queue_count(), 0);
        assert!(arcade.ledger().audit().is_empty());
    }

    #[test]
    fn test_unknown_game_surfaces_before_auth() {
        let mut arcade = arcade();
        let alice = Identity::from("alice");
        assert_eq!(
            arcade.execute(
                &alice,
                Instruction::InitQueue {
                    game: GameId(404),
                    player: alice.clone(),
                },
            ),
            Err(ArcadeError::UnknownGame(GameId(404)))
        );
    }

    #[test]
    fn test_json_instruction_and_snapshot() {
        let mut arcade = arcade();
        let game = create(&mut arcade, &root(), 2, GameMode::Normal);
        let json = format!(
            r#"{{"op": "init_queue", "game": {}, "player": "alice"}}"#,
            game.0
        );
        let ix: Instruction = serde_json::from_str(&json).unwrap();
        arcade.execute(&Identity::from("alice"), ix).unwrap();

        let snapshot = arcade.snapshot().unwrap();
        let restored = Arcade::restore(ArcadeConfig::new(root()), &snapshot).unwrap();
        assert_eq!(
            restored.ledger().slot_views(game).unwrap(),
            arcade.ledger().slot_views(game).unwrap()
        );
        assert_eq!(restored.ledger().registry(), arcade.ledger().registry());

        assert!(matches!(
            Arcade::restore(ArcadeConfig::new(Identity::from("imposter")), &snapshot),
            Err(ArcadeError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_ids_keep_growing_after_restore() {
        let mut arcade = arcade();
        let first = create(&mut arcade, &root(), 1, GameMode::Normal);
        let snapshot = arcade.snapshot().unwrap();
        let mut restored = Arcade::restore(ArcadeConfig::new(root()), &snapshot).unwrap();
        let second = create(&mut restored, &root(), 1, GameMode::Normal);
        assert!(second > first);
    }
}
