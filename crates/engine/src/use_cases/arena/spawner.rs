//! Periodic spawner and per-word flee timers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use wordmon_domain::{Creature, SpawnId};

use crate::infrastructure::ports::ClockPort;
use crate::use_cases::generator::WordGenerator;

use super::slot::ActiveSpawnSlot;
use super::types::{ActiveSpawn, BattleOutcome, FleeReason, OutcomeFeed, SpawnNotice};

/// Capacity of the spawn notice channel. A challenger lagging further behind
/// skips the oldest notices.
const NOTICE_CAPACITY: usize = 16;

pub struct Spawner {
    generator: Arc<WordGenerator>,
    slot: Arc<ActiveSpawnSlot>,
    outcomes: Arc<OutcomeFeed>,
    clock: Arc<dyn ClockPort>,
    notices: broadcast::Sender<SpawnNotice>,
    interval: Duration,
    flee_after: Duration,
}

impl Spawner {
    pub fn new(
        generator: Arc<WordGenerator>,
        slot: Arc<ActiveSpawnSlot>,
        outcomes: Arc<OutcomeFeed>,
        clock: Arc<dyn ClockPort>,
        interval: Duration,
        flee_after: Duration,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            generator,
            slot,
            outcomes,
            clock,
            notices,
            interval,
            flee_after,
        }
    }

    /// Receiver for spawn notices. It observes closure once the spawner stops.
    pub fn subscribe(&self) -> broadcast::Receiver<SpawnNotice> {
        self.notices.subscribe()
    }

    /// Tick every `interval` until cancelled. The first tick comes one full
    /// interval after start.
    pub async fn run(self, cancel_token: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            flee_after_secs = self.flee_after.as_secs_f64(),
            "Starting spawner"
        );
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut flee_timers = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    tracing::info!("Spawner shutting down");
                    break;
                }
                _ = ticker.tick() => {}
            }

            while flee_timers.try_join_next().is_some() {}

            if let Some(spawn) = self.spawn_once().await {
                flee_timers.spawn(self.flee_timer(spawn.spawn_id, cancel_token.clone()));
            }
        }

        flee_timers.shutdown().await;
        // Dropping the only sender closes the notice channel for every challenger.
        drop(self);
    }

    /// Spawn one word if the slot is empty. Returns the new spawn, if any.
    pub async fn spawn_once(&self) -> Option<ActiveSpawn> {
        if !self.slot.is_empty().await {
            tracing::debug!("A WordMon is already active, skipping spawn");
            return None;
        }

        let creature = match Creature::new(self.generator.spawn()) {
            Ok(creature) => creature,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Generated word failed creature construction, skipping spawn"
                );
                return None;
            }
        };

        let spawn = ActiveSpawn {
            spawn_id: SpawnId::new(),
            word: creature.into_word(),
            spawned_at: self.clock.now(),
        };
        if !self.slot.try_fill(spawn.clone()).await {
            tracing::debug!("Slot filled concurrently, skipping spawn");
            return None;
        }

        tracing::info!(
            spawn_id = %spawn.spawn_id,
            word = %spawn.word.text,
            rarity = %spawn.word.rarity,
            points = spawn.word.points,
            "WordMon spawned"
        );
        if self.notices.send(SpawnNotice::from(&spawn)).is_err() {
            tracing::debug!(spawn_id = %spawn.spawn_id, "No challenger is listening");
        }
        Some(spawn)
    }

    /// Clears the spawn after `flee_after` unless arbitration took it first.
    fn flee_timer(
        &self,
        spawn_id: SpawnId,
        cancel_token: CancellationToken,
    ) -> impl std::future::Future<Output = ()> + Send + 'static {
        let slot = self.slot.clone();
        let outcomes = self.outcomes.clone();
        let flee_after = self.flee_after;

        async move {
            tokio::select! {
                _ = cancel_token.cancelled() => return,
                _ = tokio::time::sleep(flee_after) => {}
            }

            if let Some(spawn) = slot.take_if(spawn_id).await {
                tracing::info!(
                    spawn_id = %spawn.spawn_id,
                    word = %spawn.word.text,
                    "No attempt in time, WordMon fled"
                );
                outcomes
                    .publish(BattleOutcome::Fled {
                        spawn_id: spawn.spawn_id,
                        word: spawn.word,
                        reason: FleeReason::Timeout,
                    })
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedRandom, SystemClock};
    use tokio::sync::broadcast::error::RecvError;
    use wordmon_domain::{Rarity, RarityWeights, Word, WordCatalog};

    fn generator_with(word: Word) -> Arc<WordGenerator> {
        let catalog = WordCatalog::new(RarityWeights::default()).with_word(word);
        Arc::new(WordGenerator::new(Arc::new(catalog), Arc::new(FixedRandom(0))))
    }

    fn setup(word: Word) -> (Spawner, Arc<ActiveSpawnSlot>, Arc<OutcomeFeed>) {
        let slot = Arc::new(ActiveSpawnSlot::new());
        let outcomes = Arc::new(OutcomeFeed::new(8));
        let spawner = Spawner::new(
            generator_with(word),
            slot.clone(),
            outcomes.clone(),
            Arc::new(SystemClock::new()),
            Duration::from_secs(10),
            Duration::from_secs(5),
        );
        (spawner, slot, outcomes)
    }

    fn chien() -> Word {
        Word::new("c002", "chien", Rarity::Common, 5)
    }

    #[tokio::test]
    async fn spawn_once_skips_while_a_spawn_is_active() {
        let (spawner, slot, _) = setup(chien());

        let first = spawner.spawn_once().await.unwrap();
        assert!(spawner.spawn_once().await.is_none());
        assert_eq!(slot.current().await, Some(first));
    }

    #[tokio::test]
    async fn malformed_word_is_not_spawned() {
        let (spawner, slot, _) = setup(Word::new("bad", "zorg", Rarity::Common, 0));

        assert!(spawner.spawn_once().await.is_none());
        assert!(slot.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_spawn_flees_once_after_timeout() {
        let (spawner, slot, outcomes) = setup(chien());
        let mut notices = spawner.subscribe();
        let mut fled = outcomes.subscribe();
        let cancel = CancellationToken::new();
        let started = Instant::now();
        let task = tokio::spawn(spawner.run(cancel.clone()));

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.word.text, "chien");
        assert_eq!(started.elapsed(), Duration::from_secs(10));

        let outcome = fled.recv().await.unwrap();
        assert_eq!(
            outcome,
            BattleOutcome::Fled {
                spawn_id: notice.spawn_id,
                word: chien(),
                reason: FleeReason::Timeout,
            }
        );
        assert_eq!(started.elapsed(), Duration::from_secs(15));
        assert!(slot.take_if(notice.spawn_id).await.is_none());

        cancel.cancel();
        task.await.unwrap();
        assert_eq!(outcomes.recent().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn captured_spawn_is_not_fled_by_its_timer() {
        let (spawner, slot, outcomes) = setup(chien());
        let mut notices = spawner.subscribe();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(spawner.run(cancel.clone()));

        let notice = notices.recv().await.unwrap();
        assert!(slot.take_if(notice.spawn_id).await.is_some());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(outcomes.recent().await.is_empty());

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_closes_the_notice_channel() {
        let (spawner, _, _) = setup(chien());
        let mut notices = spawner.subscribe();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(spawner.run(cancel.clone()));

        cancel.cancel();
        task.await.unwrap();

        assert!(matches!(notices.recv().await, Err(RecvError::Closed)));
    }
}
