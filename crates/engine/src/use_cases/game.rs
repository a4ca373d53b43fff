//! Request-facing game service.
//!
//! What a request handler calls: players, the active spawn, capture attempts
//! (through the same arbitration queue the simulated challengers use), the
//! leaderboard, server status and per-player single-player encounters.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, Mutex};
use wordmon_domain::{
    AttemptOutcome, DomainError, Encounter, EncounterState, FinishedEncounter, Player, PlayerId,
};

use crate::infrastructure::config::GameInfo;
use crate::infrastructure::ports::{ClockPort, PlayerRepo, RepoError};

use super::arena::{
    ActiveSpawn, ActiveSpawnSlot, Attempt, AttemptVerdict, Submission, SUBMIT_TIMEOUT,
};
use super::encounter::{EncounterError, PlayEncounter};
use super::generator::WordGenerator;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),
    #[error("No WordMon is currently active")]
    NoActiveSpawn,
    #[error("Battle coordinator is unavailable")]
    CoordinatorUnavailable,
    #[error("Reward application failed: {0}")]
    RewardApplicationFailed(#[source] RepoError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl From<EncounterError> for GameError {
    fn from(err: EncounterError) -> Self {
        match err {
            EncounterError::Domain(e) => Self::Domain(e),
            EncounterError::RewardApplicationFailed(e) => Self::RewardApplicationFailed(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStatus {
    pub name: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub players: usize,
    pub active_spawn: Option<ActiveSpawn>,
}

/// One player's encounter plus the log of the last finished cycle.
#[derive(Default)]
struct EncounterSession {
    encounter: Encounter,
    last_log: Vec<String>,
}

pub struct GameService {
    info: GameInfo,
    players: Arc<dyn PlayerRepo>,
    slot: Arc<ActiveSpawnSlot>,
    submissions: mpsc::Sender<Submission>,
    encounters: PlayEncounter,
    sessions: DashMap<PlayerId, Arc<Mutex<EncounterSession>>>,
    clock: Arc<dyn ClockPort>,
    started_at: DateTime<Utc>,
}

impl GameService {
    pub fn new(
        info: GameInfo,
        players: Arc<dyn PlayerRepo>,
        generator: Arc<WordGenerator>,
        slot: Arc<ActiveSpawnSlot>,
        submissions: mpsc::Sender<Submission>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let started_at = clock.now();
        Self {
            info,
            encounters: PlayEncounter::new(generator, players.clone()),
            players,
            slot,
            submissions,
            sessions: DashMap::new(),
            clock,
            started_at,
        }
    }

    // =========================================================================
    // Players
    // =========================================================================

    pub async fn create_player(&self, name: &str) -> Result<Player, GameError> {
        let player = self.players.create_player(name).await?;
        tracing::info!(player = %player.name(), player_id = %player.id(), "Player registered");
        Ok(player)
    }

    pub async fn get_player(&self, player_id: PlayerId) -> Result<Player, GameError> {
        self.players
            .get_player(player_id)
            .await?
            .ok_or(GameError::PlayerNotFound(player_id))
    }

    /// Top players by XP. `None` means 10; anything else is clamped to 1..=50.
    pub async fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<Player>, GameError> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT);
        Ok(self.players.list_players(limit).await?)
    }

    // =========================================================================
    // Concurrent arena
    // =========================================================================

    pub async fn active_spawn(&self) -> Option<ActiveSpawn> {
        self.slot.current().await
    }

    /// Answer the active spawn. The attempt is queued behind every attempt
    /// already waiting, so it may come back `TooLate`. A queue that stays full
    /// for `SUBMIT_TIMEOUT` also yields `TooLate`.
    pub async fn attempt_capture(
        &self,
        player_id: PlayerId,
        answer: &str,
    ) -> Result<AttemptVerdict, GameError> {
        let player = self.get_player(player_id).await?;
        let spawn = self.slot.current().await.ok_or(GameError::NoActiveSpawn)?;

        let (submission, verdict) = Submission::with_reply(Attempt {
            challenger: player.name().to_string(),
            player_id,
            spawn_id: spawn.spawn_id,
            answer: answer.to_string(),
            submitted_at: self.clock.now(),
        });
        match self.submissions.send_timeout(submission, SUBMIT_TIMEOUT).await {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                tracing::debug!(player_id = %player_id, "Attempt too late, arbitration queue full");
                return Ok(AttemptVerdict::TooLate);
            }
            Err(SendTimeoutError::Closed(_)) => return Err(GameError::CoordinatorUnavailable),
        }

        verdict.await.map_err(|_| GameError::CoordinatorUnavailable)
    }

    pub async fn status(&self) -> Result<GameStatus, GameError> {
        Ok(GameStatus {
            name: self.info.name.clone(),
            version: self.info.version.clone(),
            uptime_seconds: (self.clock.now() - self.started_at).num_seconds(),
            players: self.players.count_players().await?,
            active_spawn: self.slot.current().await,
        })
    }

    // =========================================================================
    // Single-player encounters
    // =========================================================================

    /// Start an encounter for the player. Returns the log so far.
    pub async fn start_encounter(&self, player_id: PlayerId) -> Result<Vec<String>, GameError> {
        self.get_player(player_id).await?;
        let session = self
            .sessions
            .entry(player_id)
            .or_default()
            .value()
            .clone();
        let mut session = session.lock().await;
        self.encounters.start(&mut session.encounter, player_id)?;
        Ok(session.encounter.log().to_vec())
    }

    pub async fn begin_battle(&self, player_id: PlayerId) -> Result<Vec<String>, GameError> {
        let session = self.session(player_id, "begin battle")?;
        let mut session = session.lock().await;
        self.encounters.begin_battle(&mut session.encounter)?;
        Ok(session.encounter.log().to_vec())
    }

    pub async fn submit(
        &self,
        player_id: PlayerId,
        answer: &str,
    ) -> Result<AttemptOutcome, GameError> {
        let session = self.session(player_id, "submit attempt")?;
        let mut session = session.lock().await;
        Ok(self.encounters.submit(&mut session.encounter, answer)?)
    }

    pub async fn resolve(&self, player_id: PlayerId) -> Result<FinishedEncounter, GameError> {
        let session = self.session(player_id, "resolve")?;
        let mut session = session.lock().await;
        let finished = self.encounters.resolve(&mut session.encounter).await?;
        session.last_log = finished.log.clone();
        Ok(finished)
    }

    pub async fn encounter_state(&self, player_id: PlayerId) -> EncounterState {
        match self.sessions.get(&player_id).map(|s| s.value().clone()) {
            Some(session) => session.lock().await.encounter.state(),
            None => EncounterState::Idle,
        }
    }

    /// The running encounter's log, or the last finished one when idle.
    pub async fn encounter_log(&self, player_id: PlayerId) -> Vec<String> {
        let Some(session) = self.sessions.get(&player_id).map(|s| s.value().clone()) else {
            return Vec::new();
        };
        let session = session.lock().await;
        if session.encounter.log().is_empty() {
            session.last_log.clone()
        } else {
            session.encounter.log().to_vec()
        }
    }

    /// Only `start_encounter` creates sessions; without one the player is idle.
    fn session(
        &self,
        player_id: PlayerId,
        action: &'static str,
    ) -> Result<Arc<Mutex<EncounterSession>>, GameError> {
        self.sessions
            .get(&player_id)
            .map(|s| s.value().clone())
            .ok_or_else(|| DomainError::invalid_transition(EncounterState::Idle, action).into())
    }
}
