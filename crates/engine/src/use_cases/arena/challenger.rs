//! Simulated challengers.
//!
//! Each challenger listens for spawn notices, decides whether to take part,
//! waits its (jittered) response time, then submits an answer: a real anagram
//! with probability `skill_level`, a plausible wrong answer otherwise.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use wordmon_domain::PlayerId;

use crate::infrastructure::ports::{ClockPort, RandomPort};

use super::types::{Attempt, SpawnNotice, Submission};

/// How long a submission may wait for room in the arbitration queue.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub struct ChallengerProfile {
    pub name: String,
    /// Probability of answering a given spawn.
    pub participation_rate: f64,
    /// Probability that an answer is a correct anagram.
    pub skill_level: f64,
    pub response_time: Duration,
}

impl ChallengerProfile {
    pub fn new(
        name: impl Into<String>,
        participation_rate: f64,
        skill_level: f64,
        response_time: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            participation_rate: participation_rate.clamp(0.0, 1.0),
            skill_level: skill_level.clamp(0.0, 1.0),
            response_time,
        }
    }

    /// Alice, Bob, Charlie and Diana.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Alice", 0.8, 0.7, Duration::from_secs(1)),
            Self::new("Bob", 0.6, 0.5, Duration::from_secs(2)),
            Self::new("Charlie", 0.9, 0.3, Duration::from_millis(500)),
            Self::new("Diana", 0.4, 0.9, Duration::from_secs(3)),
        ]
    }
}

pub struct SimulatedChallenger {
    profile: ChallengerProfile,
    player_id: PlayerId,
    random: Arc<dyn RandomPort>,
    clock: Arc<dyn ClockPort>,
    submissions: mpsc::Sender<Submission>,
}

impl SimulatedChallenger {
    pub fn new(
        profile: ChallengerProfile,
        player_id: PlayerId,
        random: Arc<dyn RandomPort>,
        clock: Arc<dyn ClockPort>,
        submissions: mpsc::Sender<Submission>,
    ) -> Self {
        Self {
            profile,
            player_id,
            random,
            clock,
            submissions,
        }
    }

    pub fn profile(&self) -> &ChallengerProfile {
        &self.profile
    }

    /// Run until cancelled or until the spawn notice channel closes.
    pub async fn run(
        self,
        mut notices: broadcast::Receiver<SpawnNotice>,
        cancel_token: CancellationToken,
    ) {
        let name = self.profile.name.clone();
        tracing::info!(
            challenger = %name,
            participation = self.profile.participation_rate,
            skill = self.profile.skill_level,
            "Starting challenger"
        );
        let me = Arc::new(self);
        let mut in_flight = JoinSet::new();

        loop {
            let notice = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    tracing::info!(challenger = %name, "Challenger shutting down");
                    break;
                }
                received = notices.recv() => match received {
                    Ok(notice) => notice,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            challenger = %name,
                            skipped,
                            "Challenger lagged behind spawns"
                        );
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!(
                            challenger = %name,
                            "Spawn channel closed, challenger stopping"
                        );
                        break;
                    }
                },
            };

            while in_flight.try_join_next().is_some() {}

            if me.random.gen_unit() >= me.profile.participation_rate {
                tracing::debug!(challenger = %name, word = %notice.word.text, "Ignoring spawn");
                continue;
            }

            let challenger = me.clone();
            let cancel = cancel_token.clone();
            in_flight.spawn(async move { challenger.attempt(notice, cancel).await });
        }

        in_flight.shutdown().await;
    }

    /// Think, answer, submit.
    async fn attempt(&self, notice: SpawnNotice, cancel_token: CancellationToken) {
        let delay = self.response_delay();
        tokio::select! {
            _ = cancel_token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        let answer = self.answer_for(&notice.word.text);
        tracing::info!(
            challenger = %self.profile.name,
            word = %notice.word.text,
            answer = %answer,
            "Challenger attempts a capture"
        );

        let submission = Submission::fire_and_forget(Attempt {
            challenger: self.profile.name.clone(),
            player_id: self.player_id,
            spawn_id: notice.spawn_id,
            answer,
            submitted_at: self.clock.now(),
        });

        tokio::select! {
            _ = cancel_token.cancelled() => {}
            sent = self.submissions.send_timeout(submission, SUBMIT_TIMEOUT) => match sent {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(_)) => {
                    tracing::debug!(
                        challenger = %self.profile.name,
                        word = %notice.word.text,
                        "Attempt too late, arbitration queue full"
                    );
                }
                Err(SendTimeoutError::Closed(_)) => {
                    tracing::debug!(
                        challenger = %self.profile.name,
                        "Attempt dropped, coordinator has stopped"
                    );
                }
            },
        }
    }

    /// Response time varied by up to 25% either way.
    fn response_delay(&self) -> Duration {
        let jitter = 0.75 + 0.5 * self.random.gen_unit();
        self.profile.response_time.mul_f64(jitter)
    }

    fn answer_for(&self, word: &str) -> String {
        if self.random.gen_unit() < self.profile.skill_level {
            shuffled_anagram(word, self.random.as_ref())
        } else {
            wrong_answer(word, self.random.as_ref())
        }
    }
}

/// Fisher-Yates shuffle of the letters. If the shuffle lands back on the
/// word, the first two letters are swapped.
pub fn shuffled_anagram(word: &str, random: &dyn RandomPort) -> String {
    let mut letters: Vec<char> = word.chars().collect();
    for j in (1..letters.len()).rev() {
        let k = usize::try_from(random.gen_range(0, i32::try_from(j).unwrap_or(i32::MAX)))
            .unwrap_or(0);
        letters.swap(j, k);
    }
    let mut result: String = letters.iter().collect();
    if result == word && letters.len() > 1 {
        letters.swap(0, 1);
        result = letters.iter().collect();
    }
    result
}

/// One of a fixed family of wrong answers, never equal to `word` itself.
pub fn wrong_answer(word: &str, random: &dyn RandomPort) -> String {
    let first: String = word.chars().take(1).collect();
    let without_last: String = {
        let mut chars: Vec<char> = word.chars().collect();
        chars.pop();
        chars.into_iter().collect()
    };
    let candidates: Vec<String> = [
        word.to_uppercase(),
        format!("{word}x"),
        without_last,
        first.repeat(3),
        "wrong".to_string(),
        format!("{word}{first}"),
    ]
    .into_iter()
    .filter(|candidate| {
        !candidate.is_empty() && candidate != word && !rearranges(candidate, word)
    })
    .collect();

    if candidates.is_empty() {
        return format!("{word}x");
    }
    let last = i32::try_from(candidates.len() - 1).unwrap_or(i32::MAX);
    let index = usize::try_from(random.gen_range(0, last)).unwrap_or(0);
    candidates
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("{word}x"))
}

/// Whether `candidate` would be accepted as an anagram of `word`.
fn rearranges(candidate: &str, word: &str) -> bool {
    let candidate = candidate.to_lowercase();
    let word = word.to_lowercase();
    if candidate == word {
        return false;
    }
    let mut a: Vec<char> = candidate.chars().collect();
    let mut b: Vec<char> = word.chars().collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}
