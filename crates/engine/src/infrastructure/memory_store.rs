//! In-memory player and word storage.
//!
//! Players live in a `DashMap`, so a capture holds the shard write lock for
//! that one player while it reads, updates and writes back XP and inventory.
//! Captures for different players proceed in parallel; captures for the same
//! player are serialized and never lose an update.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use wordmon_domain::{CaptureReceipt, Player, PlayerId, Rarity, Word, WordId};

use crate::infrastructure::ports::{PlayerRepo, RandomPort, RepoError, WordRepo};

pub struct InMemoryStore {
    players: DashMap<PlayerId, Player>,
    /// Lower-cased name -> id, for uniqueness.
    names: DashMap<String, PlayerId>,
    words: DashMap<WordId, Word>,
    random: Arc<dyn RandomPort>,
}

impl InMemoryStore {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self {
            players: DashMap::new(),
            names: DashMap::new(),
            words: DashMap::new(),
            random,
        }
    }
}

#[async_trait]
impl PlayerRepo for InMemoryStore {
    async fn create_player(&self, name: &str) -> Result<Player, RepoError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepoError::constraint("player name cannot be empty"));
        }

        match self.names.entry(name.to_lowercase()) {
            Entry::Occupied(_) => Err(RepoError::constraint(format!(
                "player name '{}' is already taken",
                name
            ))),
            Entry::Vacant(slot) => {
                let player = Player::new(PlayerId::new(), name);
                self.players.insert(player.id(), player.clone());
                slot.insert(player.id());
                tracing::debug!(player = %name, player_id = %player.id(), "Player created");
                Ok(player)
            }
        }
    }

    async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, RepoError> {
        Ok(self.players.get(&id).map(|p| p.value().clone()))
    }

    async fn list_players(&self, limit: usize) -> Result<Vec<Player>, RepoError> {
        let mut players: Vec<Player> = self.players.iter().map(|p| p.value().clone()).collect();
        players.sort_by(|a, b| b.xp().cmp(&a.xp()).then_with(|| a.name().cmp(b.name())));
        players.truncate(limit);
        Ok(players)
    }

    async fn count_players(&self) -> Result<usize, RepoError> {
        Ok(self.players.len())
    }

    async fn apply_capture(
        &self,
        player_id: PlayerId,
        word_id: &WordId,
    ) -> Result<CaptureReceipt, RepoError> {
        let word = self
            .words
            .get(word_id)
            .map(|w| w.value().clone())
            .ok_or_else(|| RepoError::not_found("Word", word_id))?;

        let mut player = self
            .players
            .get_mut(&player_id)
            .ok_or_else(|| RepoError::not_found("Player", player_id))?;

        player
            .apply_capture(&word)
            .map_err(RepoError::constraint)
    }
}

#[async_trait]
impl WordRepo for InMemoryStore {
    async fn random_word_by_rarity(&self, rarity: Rarity) -> Result<Option<Word>, RepoError> {
        let mut candidates: Vec<Word> = self
            .words
            .iter()
            .filter(|w| w.rarity == rarity)
            .map(|w| w.value().clone())
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }
        // DashMap iteration order is unspecified; sort so seeded draws repeat.
        candidates.sort_by(|a, b| a.id.cmp(&b.id));

        let last = i32::try_from(candidates.len() - 1).unwrap_or(i32::MAX);
        let index = usize::try_from(self.random.gen_range(0, last)).unwrap_or(0);
        Ok(candidates.into_iter().nth(index))
    }

    async fn seed_words(&self, words: Vec<Word>) -> Result<usize, RepoError> {
        let mut stored = 0;
        for word in words {
            word.validate().map_err(RepoError::constraint)?;
            self.words.insert(word.id.clone(), word);
            stored += 1;
        }
        Ok(stored)
    }

    async fn count_words(&self) -> Result<usize, RepoError> {
        Ok(self.words.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedRandom, SystemRandom};

    fn store() -> InMemoryStore {
        InMemoryStore::new(Arc::new(SystemRandom::seeded(11)))
    }

    fn chien() -> Word {
        Word::new("c001", "chien", Rarity::Common, 5)
    }

    #[tokio::test]
    async fn create_player_rejects_blank_and_duplicate_names() {
        let store = store();

        let ash = store.create_player("  Ash ").await.unwrap();
        assert_eq!(ash.name(), "Ash");
        assert_eq!(ash.level(), 1);

        assert!(matches!(
            store.create_player("ash").await,
            Err(RepoError::Constraint(_))
        ));
        assert!(matches!(
            store.create_player("   ").await,
            Err(RepoError::Constraint(_))
        ));
        assert_eq!(store.count_players().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn apply_capture_credits_word_and_levels_up() {
        let store = store();
        store
            .seed_words(vec![Word::new("l001", "dragon", Rarity::Legendary, 100)])
            .await
            .unwrap();
        let player = store.create_player("Ash").await.unwrap();

        let receipt = store
            .apply_capture(player.id(), &WordId::new("l001"))
            .await
            .unwrap();

        assert_eq!(receipt.xp_gained, 100);
        assert_eq!(receipt.new_level, 2);
        assert!(receipt.leveled_up);
        let stored = store.get_player(player.id()).await.unwrap().unwrap();
        assert_eq!(stored.captured_count("dragon"), 1);
        assert_eq!(stored.xp(), 100);
    }

    #[tokio::test]
    async fn apply_capture_reports_missing_player_or_word() {
        let store = store();
        store.seed_words(vec![chien()]).await.unwrap();
        let player = store.create_player("Ash").await.unwrap();

        let missing_word = store
            .apply_capture(player.id(), &WordId::new("nope"))
            .await;
        assert!(matches!(
            missing_word,
            Err(RepoError::NotFound { entity_type: "Word", .. })
        ));

        let missing_player = store
            .apply_capture(PlayerId::new(), &WordId::new("c001"))
            .await;
        assert!(matches!(
            missing_player,
            Err(RepoError::NotFound { entity_type: "Player", .. })
        ));
    }

    #[tokio::test]
    async fn list_players_sorts_by_xp_and_truncates() {
        let store = store();
        store
            .seed_words(vec![chien(), Word::new("r001", "tigre", Rarity::Rare, 20)])
            .await
            .unwrap();
        let a = store.create_player("Alice").await.unwrap();
        let b = store.create_player("Bob").await.unwrap();
        let _c = store.create_player("Charlie").await.unwrap();
        store.apply_capture(a.id(), &WordId::new("c001")).await.unwrap();
        store.apply_capture(b.id(), &WordId::new("r001")).await.unwrap();

        let top = store.list_players(2).await.unwrap();

        let names: Vec<&str> = top.iter().map(Player::name).collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[tokio::test]
    async fn seed_words_rejects_malformed_words() {
        let store = store();
        let result = store
            .seed_words(vec![Word::new("bad", "", Rarity::Common, 5)])
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
        assert_eq!(store.count_words().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn random_word_by_rarity_only_returns_that_tier() {
        let store = InMemoryStore::new(Arc::new(FixedRandom(1)));
        store
            .seed_words(vec![
                chien(),
                Word::new("c002", "chat", Rarity::Common, 5),
                Word::new("r001", "tigre", Rarity::Rare, 20),
            ])
            .await
            .unwrap();

        let common = store.random_word_by_rarity(Rarity::Common).await.unwrap();
        assert_eq!(common.unwrap().id, WordId::new("c002"));
        let rare = store.random_word_by_rarity(Rarity::Rare).await.unwrap();
        assert_eq!(rare.unwrap().text, "tigre");
        let legendary = store.random_word_by_rarity(Rarity::Legendary).await.unwrap();
        assert!(legendary.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_captures_for_one_player_lose_no_update() {
        let store = Arc::new(store());
        store
            .seed_words(vec![chien(), Word::new("r001", "tigre", Rarity::Rare, 20)])
            .await
            .unwrap();
        let player_id = store.create_player("Ash").await.unwrap().id();

        let mut handles = Vec::new();
        for i in 0..200 {
            let store = store.clone();
            let word_id = if i % 2 == 0 { "c001" } else { "r001" };
            handles.push(tokio::spawn(async move {
                store
                    .apply_capture(player_id, &WordId::new(word_id))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let player = store.get_player(player_id).await.unwrap().unwrap();
        assert_eq!(player.xp(), 100 * 5 + 100 * 20);
        assert_eq!(player.captured_count("chien"), 100);
        assert_eq!(player.captured_count("tigre"), 100);
        assert_eq!(player.total_captures(), 200);
    }
}
