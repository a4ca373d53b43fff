//! Messages exchanged between arena tasks.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, oneshot, RwLock};
use wordmon_domain::{CaptureReceipt, PlayerId, SpawnId, Word};

/// The word currently open for capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSpawn {
    pub spawn_id: SpawnId,
    pub word: Word,
    pub spawned_at: DateTime<Utc>,
}

/// Announced to challengers when a word spawns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnNotice {
    pub spawn_id: SpawnId,
    pub word: Word,
}

impl From<&ActiveSpawn> for SpawnNotice {
    fn from(spawn: &ActiveSpawn) -> Self {
        Self {
            spawn_id: spawn.spawn_id,
            word: spawn.word.clone(),
        }
    }
}

/// One answer to one spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub challenger: String,
    pub player_id: PlayerId,
    pub spawn_id: SpawnId,
    pub answer: String,
    pub submitted_at: DateTime<Utc>,
}

/// An attempt on its way to the coordinator, with an optional reply channel
/// for callers that wait on the verdict.
#[derive(Debug)]
pub struct Submission {
    pub attempt: Attempt,
    pub reply: Option<oneshot::Sender<AttemptVerdict>>,
}

impl Submission {
    pub fn fire_and_forget(attempt: Attempt) -> Self {
        Self {
            attempt,
            reply: None,
        }
    }

    pub fn with_reply(attempt: Attempt) -> (Self, oneshot::Receiver<AttemptVerdict>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                attempt,
                reply: Some(tx),
            },
            rx,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FleeReason {
    WrongAnswer,
    InvalidAttempt,
    Timeout,
}

/// What happened to the attempt that was handed to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptVerdict {
    Captured { xp_gained: u32, new_level: u32 },
    Fled { reason: FleeReason },
    /// Arbitration for that spawn had already closed.
    TooLate,
    /// The attempt won but the reward could not be stored.
    RewardFailed { message: String },
}

/// How a spawn ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BattleOutcome {
    Captured {
        spawn_id: SpawnId,
        word: Word,
        challenger: String,
        receipt: CaptureReceipt,
    },
    Fled {
        spawn_id: SpawnId,
        word: Word,
        reason: FleeReason,
    },
}

impl BattleOutcome {
    pub fn spawn_id(&self) -> SpawnId {
        match self {
            Self::Captured { spawn_id, .. } | Self::Fled { spawn_id, .. } => *spawn_id,
        }
    }
}

/// Broadcast of battle outcomes plus a bounded history of the latest ones.
pub struct OutcomeFeed {
    sender: broadcast::Sender<BattleOutcome>,
    history: RwLock<VecDeque<BattleOutcome>>,
    capacity: usize,
}

impl OutcomeFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            history: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn publish(&self, outcome: BattleOutcome) {
        {
            let mut history = self.history.write().await;
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(outcome.clone());
        }
        // No subscribers is fine.
        let _ = self.sender.send(outcome);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BattleOutcome> {
        self.sender.subscribe()
    }

    /// Oldest first.
    pub async fn recent(&self) -> Vec<BattleOutcome> {
        self.history.read().await.iter().cloned().collect()
    }
}
