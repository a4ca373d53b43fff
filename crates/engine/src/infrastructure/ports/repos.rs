//! Repository port traits for player and word storage.

use async_trait::async_trait;
use wordmon_domain::{CaptureReceipt, Player, PlayerId, Rarity, Word, WordId};

use super::error::RepoError;

// =============================================================================
// Player Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerRepo: Send + Sync {
    /// Register a new player. Names are unique.
    async fn create_player(&self, name: &str) -> Result<Player, RepoError>;
    async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, RepoError>;
    /// Players ordered by XP descending, at most `limit` of them.
    async fn list_players(&self, limit: usize) -> Result<Vec<Player>, RepoError>;
    async fn count_players(&self) -> Result<usize, RepoError>;

    /// Credit `word_id` to the player: inventory +1, XP + points, level
    /// recomputed. Atomic with respect to every other capture for the same
    /// player.
    async fn apply_capture(
        &self,
        player_id: PlayerId,
        word_id: &WordId,
    ) -> Result<CaptureReceipt, RepoError>;
}

// =============================================================================
// Word Storage
// =============================================================================

#[async_trait]
pub trait WordRepo: Send + Sync {
    async fn random_word_by_rarity(&self, rarity: Rarity) -> Result<Option<Word>, RepoError>;
    /// Insert or replace words by id. Returns how many were stored.
    async fn seed_words(&self, words: Vec<Word>) -> Result<usize, RepoError>;
    async fn count_words(&self) -> Result<usize, RepoError>;
}
