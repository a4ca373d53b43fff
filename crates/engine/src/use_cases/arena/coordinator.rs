//! Battle coordinator.
//!
//! The single consumer of the arbitration queue. Attempts are handled one at
//! a time in arrival order: the first attempt naming the active spawn takes
//! the slot and is the only one evaluated for it, right or wrong. Everything
//! after that for the same spawn is answered `TooLate`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wordmon_domain::Challenge;

use crate::infrastructure::ports::PlayerRepo;

use super::slot::ActiveSpawnSlot;
use super::types::{
    ActiveSpawn, Attempt, AttemptVerdict, BattleOutcome, FleeReason, OutcomeFeed, Submission,
};

pub struct BattleCoordinator {
    slot: Arc<ActiveSpawnSlot>,
    players: Arc<dyn PlayerRepo>,
    outcomes: Arc<OutcomeFeed>,
    submissions: mpsc::Receiver<Submission>,
}

impl BattleCoordinator {
    pub fn new(
        slot: Arc<ActiveSpawnSlot>,
        players: Arc<dyn PlayerRepo>,
        outcomes: Arc<OutcomeFeed>,
        submissions: mpsc::Receiver<Submission>,
    ) -> Self {
        Self {
            slot,
            players,
            outcomes,
            submissions,
        }
    }

    /// Run until cancelled or until every submitter is gone. Attempts still
    /// queued at shutdown are drained and answered `TooLate`.
    pub async fn run(mut self, cancel_token: CancellationToken) {
        tracing::info!("Starting battle coordinator");
        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    tracing::info!("Battle coordinator shutting down");
                    break;
                }
                submission = self.submissions.recv() => match submission {
                    Some(submission) => self.handle(submission).await,
                    None => {
                        tracing::info!("All submitters gone, battle coordinator stopping");
                        break;
                    }
                },
            }
        }

        self.submissions.close();
        let mut drained = 0usize;
        while let Ok(submission) = self.submissions.try_recv() {
            reply(submission, AttemptVerdict::TooLate);
            drained += 1;
        }
        if drained > 0 {
            tracing::debug!(drained, "Discarded attempts queued at shutdown");
        }
    }

    async fn handle(&self, submission: Submission) {
        let verdict = self.arbitrate(&submission.attempt).await;
        reply(submission, verdict);
    }

    /// Decide one attempt.
    pub async fn arbitrate(&self, attempt: &Attempt) -> AttemptVerdict {
        let Some(spawn) = self.slot.take_if(attempt.spawn_id).await else {
            tracing::debug!(
                challenger = %attempt.challenger,
                spawn_id = %attempt.spawn_id,
                "Attempt arrived too late"
            );
            return AttemptVerdict::TooLate;
        };

        let mut challenge = Challenge::for_word(&spawn.word);
        match challenge.check(&attempt.answer) {
            Ok(true) => self.capture(spawn, attempt).await,
            Ok(false) => {
                tracing::info!(
                    challenger = %attempt.challenger,
                    word = %spawn.word.text,
                    answer = %attempt.answer,
                    "Wrong answer, WordMon fled"
                );
                self.flee(spawn, FleeReason::WrongAnswer).await
            }
            Err(reason) => {
                tracing::info!(
                    challenger = %attempt.challenger,
                    word = %spawn.word.text,
                    answer = %attempt.answer,
                    %reason,
                    "Invalid attempt, WordMon fled"
                );
                self.flee(spawn, FleeReason::InvalidAttempt).await
            }
        }
    }

    async fn capture(&self, spawn: ActiveSpawn, attempt: &Attempt) -> AttemptVerdict {
        match self
            .players
            .apply_capture(attempt.player_id, &spawn.word.id)
            .await
        {
            Ok(receipt) => {
                tracing::info!(
                    challenger = %attempt.challenger,
                    word = %spawn.word.text,
                    xp_gained = receipt.xp_gained,
                    new_level = receipt.new_level,
                    "WordMon captured"
                );
                let verdict = AttemptVerdict::Captured {
                    xp_gained: receipt.xp_gained,
                    new_level: receipt.new_level,
                };
                self.outcomes
                    .publish(BattleOutcome::Captured {
                        spawn_id: spawn.spawn_id,
                        word: spawn.word,
                        challenger: attempt.challenger.clone(),
                        receipt,
                    })
                    .await;
                verdict
            }
            Err(e) => {
                tracing::error!(
                    challenger = %attempt.challenger,
                    player_id = %attempt.player_id,
                    word = %spawn.word.text,
                    error = %e,
                    "Failed to apply capture reward"
                );
                AttemptVerdict::RewardFailed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn flee(&self, spawn: ActiveSpawn, reason: FleeReason) -> AttemptVerdict {
        self.outcomes
            .publish(BattleOutcome::Fled {
                spawn_id: spawn.spawn_id,
                word: spawn.word,
                reason,
            })
            .await;
        AttemptVerdict::Fled { reason }
    }
}

fn reply(submission: Submission, verdict: AttemptVerdict) {
    if let Some(reply) = submission.reply {
        // The caller may have stopped waiting.
        let _ = reply.send(verdict);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockPlayerRepo, RepoError};
    use chrono::Utc;
    use wordmon_domain::{CaptureReceipt, PlayerId, Rarity, SpawnId, Word};

    fn chien_spawn() -> ActiveSpawn {
        ActiveSpawn {
            spawn_id: SpawnId::new(),
            word: Word::new("c002", "chien", Rarity::Common, 5),
            spawned_at: Utc::now(),
        }
    }

    fn attempt(spawn: &ActiveSpawn, who: &str, player_id: PlayerId, answer: &str) -> Attempt {
        Attempt {
            challenger: who.to_string(),
            player_id,
            spawn_id: spawn.spawn_id,
            answer: answer.to_string(),
            submitted_at: Utc::now(),
        }
    }

    fn receipt(player_id: PlayerId) -> CaptureReceipt {
        CaptureReceipt {
            player_id,
            word_text: "chien".to_string(),
            xp_gained: 5,
            new_xp: 5,
            new_level: 1,
            leveled_up: false,
        }
    }

    async fn setup(
        players: MockPlayerRepo,
        spawn: &ActiveSpawn,
    ) -> (
        BattleCoordinator,
        Arc<ActiveSpawnSlot>,
        Arc<OutcomeFeed>,
        mpsc::Sender<Submission>,
    ) {
        let slot = Arc::new(ActiveSpawnSlot::new());
        slot.try_fill(spawn.clone()).await;
        let outcomes = Arc::new(OutcomeFeed::new(16));
        let (tx, rx) = mpsc::channel(8);
        let coordinator =
            BattleCoordinator::new(slot.clone(), Arc::new(players), outcomes.clone(), rx);
        (coordinator, slot, outcomes, tx)
    }

    #[tokio::test]
    async fn correct_first_attempt_captures_and_later_ones_are_too_late() {
        let spawn = chien_spawn();
        let alice = PlayerId::new();
        let bob = PlayerId::new();

        let mut players = MockPlayerRepo::new();
        players
            .expect_apply_capture()
            .withf(move |id, word| *id == alice && word.as_str() == "c002")
            .times(1)
            .returning(move |_, _| Ok(receipt(alice)));
        let (coordinator, slot, outcomes, _tx) = setup(players, &spawn).await;

        let first = coordinator
            .arbitrate(&attempt(&spawn, "Alice", alice, "niche"))
            .await;
        let second = coordinator
            .arbitrate(&attempt(&spawn, "Bob", bob, "niche"))
            .await;

        assert_eq!(
            first,
            AttemptVerdict::Captured {
                xp_gained: 5,
                new_level: 1
            }
        );
        assert_eq!(second, AttemptVerdict::TooLate);
        assert!(slot.is_empty().await);
        let recent = outcomes.recent().await;
        assert_eq!(recent.len(), 1);
        assert!(matches!(
            &recent[0],
            BattleOutcome::Captured { challenger, .. } if challenger == "Alice"
        ));
    }

    #[tokio::test]
    async fn wrong_first_attempt_flees_even_if_next_is_correct() {
        let spawn = chien_spawn();
        let mut players = MockPlayerRepo::new();
        players.expect_apply_capture().never();
        let (coordinator, slot, outcomes, _tx) = setup(players, &spawn).await;

        let first = coordinator
            .arbitrate(&attempt(&spawn, "Diana", PlayerId::new(), "chienx"))
            .await;
        let second = coordinator
            .arbitrate(&attempt(&spawn, "Charlie", PlayerId::new(), "niche"))
            .await;

        assert_eq!(
            first,
            AttemptVerdict::Fled {
                reason: FleeReason::WrongAnswer
            }
        );
        assert_eq!(second, AttemptVerdict::TooLate);
        assert!(slot.is_empty().await);
        assert_eq!(outcomes.recent().await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_first_attempt_flees_as_invalid() {
        let spawn = chien_spawn();
        let mut players = MockPlayerRepo::new();
        players.expect_apply_capture().never();
        let (coordinator, _slot, _outcomes, _tx) = setup(players, &spawn).await;

        let verdict = coordinator
            .arbitrate(&attempt(&spawn, "Bob", PlayerId::new(), "CHIEN"))
            .await;

        assert_eq!(
            verdict,
            AttemptVerdict::Fled {
                reason: FleeReason::InvalidAttempt
            }
        );
    }

    #[tokio::test]
    async fn attempt_for_another_spawn_is_too_late_and_leaves_slot() {
        let spawn = chien_spawn();
        let stale = chien_spawn();
        let mut players = MockPlayerRepo::new();
        players.expect_apply_capture().never();
        let (coordinator, slot, _outcomes, _tx) = setup(players, &spawn).await;

        let verdict = coordinator
            .arbitrate(&attempt(&stale, "Bob", PlayerId::new(), "niche"))
            .await;

        assert_eq!(verdict, AttemptVerdict::TooLate);
        assert_eq!(slot.current().await, Some(spawn));
    }

    #[tokio::test]
    async fn reward_failure_is_reported_not_published() {
        let spawn = chien_spawn();
        let mut players = MockPlayerRepo::new();
        players
            .expect_apply_capture()
            .returning(|id, _| Err(RepoError::not_found("Player", id)));
        let (coordinator, _slot, outcomes, _tx) = setup(players, &spawn).await;

        let verdict = coordinator
            .arbitrate(&attempt(&spawn, "Ghost", PlayerId::new(), "niche"))
            .await;

        assert!(matches!(verdict, AttemptVerdict::RewardFailed { .. }));
        assert!(outcomes.recent().await.is_empty());
    }

    #[tokio::test]
    async fn run_replies_in_arrival_order_and_drains_on_cancel() {
        let spawn = chien_spawn();
        let alice = PlayerId::new();
        let mut players = MockPlayerRepo::new();
        players
            .expect_apply_capture()
            .times(1)
            .returning(move |_, _| Ok(receipt(alice)));
        let (coordinator, _slot, _outcomes, tx) = setup(players, &spawn).await;

        let (first, first_rx) =
            Submission::with_reply(attempt(&spawn, "Alice", alice, "niche"));
        let (second, second_rx) =
            Submission::with_reply(attempt(&spawn, "Bob", PlayerId::new(), "niche"));
        tx.send(first).await.unwrap();
        tx.send(second).await.unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(coordinator.run(cancel.clone()));

        assert!(matches!(first_rx.await.unwrap(), AttemptVerdict::Captured { .. }));
        assert_eq!(second_rx.await.unwrap(), AttemptVerdict::TooLate);

        cancel.cancel();
        task.await.unwrap();
        let late = Submission::fire_and_forget(attempt(&spawn, "Late", alice, "niche"));
        assert!(tx.send(late).await.is_err());
    }
}
