//! Top-3 leaderboard embedded in every game.

use serde::{Deserialize, Serialize};

use super::error::ArcadeError;
use super::ids::{GameId, Identity};
use super::ledger::Ledger;

/// Number of ranks a leaderboard keeps.
pub const LEADERBOARD_RANKS: usize = 3;

/// One ranked score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub owner_wallet: Identity,
    pub score: u64,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>, owner_wallet: Identity, score: u64) -> Self {
        Self {
            name: name.into(),
            owner_wallet,
            score,
        }
    }
}

/// Fixed three-rank score table, highest first.
///
/// Unset ranks only ever appear below set ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    ranks: [Option<LeaderboardEntry>; LEADERBOARD_RANKS],
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first(&self) -> Option<&LeaderboardEntry> {
        self.ranks[0].as_ref()
    }

    pub fn second(&self) -> Option<&LeaderboardEntry> {
        self.ranks[1].as_ref()
    }

    pub fn third(&self) -> Option<&LeaderboardEntry> {
        self.ranks[2].as_ref()
    }

    /// Set entries, best first.
    pub fn entries(&self) -> impl Iterator<Item = &LeaderboardEntry> {
        self.ranks.iter().flatten()
    }

    /// Merge a score into the table.
    ///
    /// The entry takes the first rank that is unset or holds a strictly lower
    /// score; everything below shifts down one and the old third falls off.
    /// An equal score never displaces an earlier one. Returns the rank taken
    /// (0 = first), or `None` when the score does not place.
    pub fn submit(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let rank = self.ranks.iter().position(|slot| match slot {
            None => true,
            Some(existing) => entry.score > existing.score,
        })?;

        // Shift lower ranks down, dropping whatever was last.
        for i in (rank + 1..LEADERBOARD_RANKS).rev() {
            self.ranks[i] = self.ranks[i - 1].take();
        }
        self.ranks[rank] = Some(entry);
        Some(rank)
    }

    /// Check descending order with no set rank below an unset one.
    pub fn is_well_ordered(&self) -> bool {
        let mut previous: Option<u64> = None;
        let mut seen_gap = false;
        for slot in &self.ranks {
            match slot {
                None => seen_gap = true,
                Some(_) if seen_gap => return false,
                Some(entry) => {
                    if previous.is_some_and(|p| entry.score > p) {
                        return false;
                    }
                    previous = Some(entry.score);
                }
            }
        }
        true
    }

    pub fn to_json(&self) -> serde_json::Value {
        let ranks: Vec<serde_json::Value> = self
            .ranks
            .iter()
            .map(|slot| match slot {
                Some(e) => serde_json::json!({
                    "name": e.name,
                    "wallet": e.owner_wallet,
                    "score": e.score
                }),
                None => serde_json::Value::Null,
            })
            .collect();
        serde_json::Value::Array(ranks)
    }
}

impl Ledger {
    /// Merge a score into a game's leaderboard. A score that does not place
    /// is a successful no-op.
    pub fn update_leaderboard(
        &mut self,
        game_id: GameId,
        name: String,
        score: u64,
        wallet: Identity,
    ) -> Result<Option<usize>, ArcadeError> {
        let game = self.game_mut(game_id)?;
        let rank = game
            .leaderboard
            .submit(LeaderboardEntry::new(name, wallet, score));
        tracing::debug!(game = %game_id, score, rank = ?rank, "leaderboard submission");
        Ok(rank)
    }
}
