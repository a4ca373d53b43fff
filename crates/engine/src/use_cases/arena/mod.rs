//! Concurrent arena: one spawner, one battle coordinator, a flee timer per
//! spawned word and any number of challengers, all sharing one active-spawn
//! slot and one cancellation token.

mod challenger;
mod coordinator;
mod slot;
mod spawner;
mod types;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wordmon_domain::PlayerId;

use crate::infrastructure::config::SpawnerConfig;
use crate::infrastructure::ports::{ClockPort, PlayerRepo, RandomPort};

use super::generator::WordGenerator;

pub use challenger::{
    shuffled_anagram, wrong_answer, ChallengerProfile, SimulatedChallenger, SUBMIT_TIMEOUT,
};
pub use coordinator::BattleCoordinator;
pub use slot::ActiveSpawnSlot;
pub use spawner::Spawner;
pub use types::{
    ActiveSpawn, Attempt, AttemptVerdict, BattleOutcome, FleeReason, OutcomeFeed, SpawnNotice,
    Submission,
};

/// How long shutdown waits for tasks before giving up on them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaConfig {
    pub spawn_interval: Duration,
    pub flee_after: Duration,
    /// Bound of the arbitration queue.
    pub queue_capacity: usize,
    /// How many recent outcomes are kept.
    pub history: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::from(&SpawnerConfig::default())
    }
}

impl From<&SpawnerConfig> for ArenaConfig {
    fn from(spawner: &SpawnerConfig) -> Self {
        Self {
            spawn_interval: spawner.interval(),
            flee_after: spawner.flee_after(),
            queue_capacity: 32,
            history: 50,
        }
    }
}

/// A challenger to start with the arena, playing as `player_id`.
#[derive(Debug, Clone)]
pub struct Contender {
    pub profile: ChallengerProfile,
    pub player_id: PlayerId,
}

/// Handle on the running arena tasks.
pub struct Arena {
    slot: Arc<ActiveSpawnSlot>,
    outcomes: Arc<OutcomeFeed>,
    submissions: mpsc::Sender<Submission>,
    cancel_token: CancellationToken,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl Arena {
    /// Spawn every arena task. Must be called from within a tokio runtime.
    pub fn start(
        config: ArenaConfig,
        generator: Arc<WordGenerator>,
        players: Arc<dyn PlayerRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        contenders: Vec<Contender>,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let slot = Arc::new(ActiveSpawnSlot::new());
        let outcomes = Arc::new(OutcomeFeed::new(config.history));
        let (submissions, queue) = mpsc::channel(config.queue_capacity.max(1));
        let mut tasks = Vec::new();

        let spawner = Spawner::new(
            generator,
            slot.clone(),
            outcomes.clone(),
            clock.clone(),
            config.spawn_interval,
            config.flee_after,
        );

        for contender in contenders {
            let notices = spawner.subscribe();
            let name = format!("challenger:{}", contender.profile.name);
            let challenger = SimulatedChallenger::new(
                contender.profile,
                contender.player_id,
                random.clone(),
                clock.clone(),
                submissions.clone(),
            );
            let cancel = cancel_token.clone();
            tasks.push((name, tokio::spawn(challenger.run(notices, cancel))));
        }

        let coordinator = BattleCoordinator::new(slot.clone(), players, outcomes.clone(), queue);
        tasks.push((
            "coordinator".to_string(),
            tokio::spawn(coordinator.run(cancel_token.clone())),
        ));
        tasks.push((
            "spawner".to_string(),
            tokio::spawn(spawner.run(cancel_token.clone())),
        ));

        tracing::info!(tasks = tasks.len(), "Arena started");
        Self {
            slot,
            outcomes,
            submissions,
            cancel_token,
            tasks,
        }
    }

    pub fn slot(&self) -> Arc<ActiveSpawnSlot> {
        self.slot.clone()
    }

    pub fn outcomes(&self) -> Arc<OutcomeFeed> {
        self.outcomes.clone()
    }

    /// Sender into the arbitration queue, for request-driven attempts.
    pub fn submitter(&self) -> mpsc::Sender<Submission> {
        self.submissions.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Cancel every task and wait for them to finish.
    pub async fn shutdown(self) {
        tracing::info!("Arena shutting down");
        self.cancel_token.cancel();
        drop(self.submissions);

        let joined = tokio::time::timeout(SHUTDOWN_GRACE, async {
            for (name, task) in self.tasks {
                if let Err(e) = task.await {
                    tracing::error!(task = %name, error = %e, "Arena task failed");
                }
            }
        })
        .await;

        if joined.is_err() {
            tracing::warn!("Arena tasks did not finish within the shutdown grace period");
        } else {
            tracing::info!("Arena shutdown complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{SystemClock, SystemRandom};
    use crate::infrastructure::memory_store::InMemoryStore;
    use crate::infrastructure::ports::WordRepo;
    use wordmon_domain::{Rarity, RarityWeights, Word, WordCatalog};

    fn chien() -> Word {
        Word::new("c002", "chien", Rarity::Common, 5)
    }

    async fn fixture() -> (Arc<InMemoryStore>, Arc<WordGenerator>, Arc<SystemRandom>) {
        let random = Arc::new(SystemRandom::seeded(21));
        let store = Arc::new(InMemoryStore::new(random.clone()));
        store.seed_words(vec![chien()]).await.unwrap();
        let catalog = WordCatalog::new(RarityWeights::default()).with_word(chien());
        let generator = Arc::new(WordGenerator::new(Arc::new(catalog), random.clone()));
        (store, generator, random)
    }

    fn config() -> ArenaConfig {
        ArenaConfig {
            spawn_interval: Duration::from_secs(10),
            flee_after: Duration::from_secs(5),
            queue_capacity: 8,
            history: 16,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn perfect_challenger_captures_every_spawn() {
        let (store, generator, random) = fixture().await;
        let ace = store.create_player("Ace").await.unwrap();
        let arena = Arena::start(
            config(),
            generator,
            store.clone(),
            Arc::new(SystemClock::new()),
            random,
            vec![Contender {
                profile: ChallengerProfile::new("Ace", 1.0, 1.0, Duration::from_secs(1)),
                player_id: ace.id(),
            }],
        );
        let outcomes = arena.outcomes();

        tokio::time::sleep(Duration::from_secs(35)).await;
        arena.shutdown().await;

        let recent = outcomes.recent().await;
        assert_eq!(recent.len(), 3);
        assert!(recent
            .iter()
            .all(|o| matches!(o, BattleOutcome::Captured { challenger, .. } if challenger == "Ace")));
        let ace = store.get_player(ace.id()).await.unwrap().unwrap();
        assert_eq!(ace.xp(), 15);
        assert_eq!(ace.captured_count("chien"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn without_challengers_every_spawn_times_out() {
        let (store, generator, random) = fixture().await;
        let arena = Arena::start(
            config(),
            generator,
            store,
            Arc::new(SystemClock::new()),
            random,
            Vec::new(),
        );
        let outcomes = arena.outcomes();
        let slot = arena.slot();

        tokio::time::sleep(Duration::from_secs(26)).await;
        assert!(slot.is_empty().await);
        arena.shutdown().await;

        let recent = outcomes.recent().await;
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|o| matches!(
            o,
            BattleOutcome::Fled {
                reason: FleeReason::Timeout,
                ..
            }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_does_not_wait_for_pending_delays() {
        let (store, generator, random) = fixture().await;
        let slow = store.create_player("Slow").await.unwrap();
        let arena = Arena::start(
            config(),
            generator,
            store,
            Arc::new(SystemClock::new()),
            random,
            vec![Contender {
                profile: ChallengerProfile::new("Slow", 1.0, 1.0, Duration::from_secs(4)),
                player_id: slow.id(),
            }],
        );

        tokio::time::sleep(Duration::from_secs(11)).await;
        let started = tokio::time::Instant::now();
        arena.shutdown().await;

        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
