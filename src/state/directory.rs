//! Game directory.
//!
//! Games form a doubly-linked list anchored at the registry: the most recent
//! game is the head (no younger neighbor) and the genesis game is the tail (no
//! older neighbor). Links are game ids, so unlinking is a constant-time relink
//! of the two neighbors.
//!
//! ```text
//!   Registry.most_recent_game
//!              │
//!              ▼
//!        ┌──────────┐ older  ┌──────────┐ older  ┌──────────┐
//!        │  game 7  │───────▶│  game 4  │───────▶│ genesis  │
//!        │ (head)   │◀───────│          │◀───────│          │
//!        └──────────┘ younger└──────────┘ younger└──────────┘
//! ```
//!
//! Deletions name the neighbors the caller read; if the live links moved in
//! the meantime the deletion is rejected as stale.

use super::error::ArcadeError;
use super::game::{Game, NewGame};
use super::ids::{describe, GameId};
use super::ledger::Ledger;

impl Ledger {
    /// Insert a new game at the head of the directory.
    pub fn create_game(&mut self, params: NewGame) -> Result<GameId, ArcadeError> {
        if !params.mode.supports(params.max_players) {
            return Err(ArcadeError::InvalidPlayerCount {
                mode: params.mode,
                max_players: params.max_players,
            });
        }

        let previous_head = self.registry().most_recent_game;
        // The head must exist before anything is allocated.
        self.game(previous_head)?;

        let id = GameId(self.allocate());
        let mut game = Game::new(id, params);
        game.older_game = Some(previous_head);
        self.games.insert(id, game);

        self.game_mut(previous_head)?.younger_game = Some(id);
        self.registry_mut().most_recent_game = id;

        tracing::debug!(game = %id, older = %previous_head, "game linked at head");
        Ok(id)
    }

    /// Remove the head of the directory; `older_game` becomes the new head.
    pub fn delete_most_recent_game(
        &mut self,
        game_id: GameId,
        older_game: GameId,
    ) -> Result<Game, ArcadeError> {
        let head = self.registry().most_recent_game;
        if game_id != head {
            return Err(ArcadeError::NotMostRecent {
                game: game_id,
                head,
            });
        }
        let game = self.game(game_id)?;
        if game.older_game != Some(older_game) {
            return Err(ArcadeError::stale(
                "older game",
                older_game,
                describe(game.older_game),
            ));
        }
        self.game(older_game)?;

        self.game_mut(older_game)?.younger_game = None;
        self.registry_mut().most_recent_game = older_game;
        let removed = self.unlink(game_id)?;

        tracing::debug!(game = %game_id, head = %older_game, "head game deleted");
        Ok(removed)
    }

    /// Remove a game from the interior of the directory.
    pub fn delete_game(
        &mut self,
        game_id: GameId,
        younger_game: GameId,
        older_game: GameId,
    ) -> Result<Game, ArcadeError> {
        let game = self.game(game_id)?;
        if game.younger_game != Some(younger_game) {
            return Err(ArcadeError::stale(
                "younger game",
                younger_game,
                describe(game.younger_game),
            ));
        }
        if game.older_game != Some(older_game) {
            return Err(ArcadeError::stale(
                "older game",
                older_game,
                describe(game.older_game),
            ));
        }

        let younger = self.game(younger_game)?;
        if younger.older_game != Some(game_id) {
            return Err(ArcadeError::stale(
                "younger game's older link",
                game_id,
                describe(younger.older_game),
            ));
        }
        let older = self.game(older_game)?;
        if older.younger_game != Some(game_id) {
            return Err(ArcadeError::stale(
                "older game's younger link",
                game_id,
                describe(older.younger_game),
            ));
        }

        self.game_mut(younger_game)?.older_game = Some(older_game);
        self.game_mut(older_game)?.younger_game = Some(younger_game);
        let removed = self.unlink(game_id)?;

        tracing::debug!(game = %game_id, younger = %younger_game, older = %older_game, "game deleted");
        Ok(removed)
    }

    /// Walk the directory from the head towards genesis.
    pub fn games_newest_first(&self) -> impl Iterator<Item = &Game> + '_ {
        let mut cursor = Some(self.registry().most_recent_game);
        std::iter::from_fn(move || {
            let game = self.games.get(&cursor?)?;
            cursor = game.older_game;
            Some(game)
        })
    }

    /// Drop a game record together with any queues still attached to it.
    fn unlink(&mut self, game_id: GameId) -> Result<Game, ArcadeError> {
        let game = self
            .games
            .remove(&game_id)
            .ok_or(ArcadeError::UnknownGame(game_id))?;
        for (_, queue) in game.attached_queues() {
            self.queues.remove(&queue);
        }
        Ok(game)
    }
}
