//! Application state and composition.

use std::sync::Arc;

use wordmon_domain::{Word, WordCatalog};

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::GameConfig,
    memory_store::InMemoryStore,
    ports::{ClockPort, PlayerRepo, RandomPort, RepoError, WordRepo},
};
use crate::use_cases::arena::{Arena, ArenaConfig, ChallengerProfile, Contender, OutcomeFeed};
use crate::use_cases::{GameService, WordGenerator};

/// Main application state.
///
/// Owns the store, the running arena and the game service in front of them.
pub struct App {
    pub config: GameConfig,
    pub store: Arc<InMemoryStore>,
    pub generator: Arc<WordGenerator>,
    pub game: Arc<GameService>,
    arena: Arena,
}

impl App {
    /// Create the application with the system clock and an entropy-seeded
    /// random source, and start the arena.
    pub async fn new(
        config: GameConfig,
        catalog: WordCatalog,
        challengers: Vec<ChallengerProfile>,
    ) -> Result<Self, RepoError> {
        Self::with_ports(
            config,
            catalog,
            challengers,
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
        )
        .await
    }

    pub async fn with_ports(
        config: GameConfig,
        catalog: WordCatalog,
        challengers: Vec<ChallengerProfile>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Result<Self, RepoError> {
        let store = Arc::new(InMemoryStore::new(random.clone()));

        // Every word the generator can produce must be capturable.
        let mut words: Vec<Word> = catalog.words().cloned().collect();
        words.push(Word::fallback());
        let seeded = store.seed_words(words).await?;
        tracing::info!(words = seeded, "Word store seeded");

        let mut contenders = Vec::with_capacity(challengers.len());
        for profile in challengers {
            let player = store.create_player(&profile.name).await?;
            contenders.push(Contender {
                profile,
                player_id: player.id(),
            });
        }

        let generator = Arc::new(WordGenerator::new(Arc::new(catalog), random.clone()));
        let players: Arc<dyn PlayerRepo> = store.clone();

        let arena = Arena::start(
            ArenaConfig::from(&config.spawner),
            generator.clone(),
            players.clone(),
            clock.clone(),
            random,
            contenders,
        );

        let game = Arc::new(GameService::new(
            config.game.clone(),
            players,
            generator.clone(),
            arena.slot(),
            arena.submitter(),
            clock,
        ));

        Ok(Self {
            config,
            store,
            generator,
            game,
            arena,
        })
    }

    pub fn outcomes(&self) -> Arc<OutcomeFeed> {
        self.arena.outcomes()
    }

    /// Stop the arena and wait for its tasks.
    pub async fn shutdown(self) {
        self.arena.shutdown().await;
    }
}
