//! Encounter aggregate - one player's interaction with one creature.
//!
//! ```text
//! IDLE -> ENCOUNTERED -> IN_BATTLE -> WON  -> CAPTURED -> IDLE
//!                                  \-> LOST -> FLED     -> IDLE
//! ```
//!
//! The aggregate is synchronous and owns no player state. Capturing is split
//! in two steps so that the caller can apply the reward wherever the player
//! lives: [`Encounter::pending_resolution`] tells what needs doing, then
//! [`Encounter::complete_capture`] or [`Encounter::flee`] finishes the cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::CaptureReceipt;
use crate::entities::{Creature, Word};
use crate::error::{AttemptError, DomainError};
use crate::ids::PlayerId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncounterState {
    #[default]
    Idle,
    Encountered,
    InBattle,
    Won,
    Lost,
    Captured,
    Fled,
}

impl fmt::Display for EncounterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Encountered => "ENCOUNTERED",
            Self::InBattle => "IN_BATTLE",
            Self::Won => "WON",
            Self::Lost => "LOST",
            Self::Captured => "CAPTURED",
            Self::Fled => "FLED",
        };
        f.write_str(s)
    }
}

/// Result of one accepted submission (one that did not fail sequencing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Correct anagram; the encounter is now `WON`.
    Won,
    /// Wrong answer with tries left; still `IN_BATTLE`.
    Retry { remaining: u32 },
    /// Wrong answer on the last try; the encounter is now `LOST`.
    Lost,
}

/// What `Resolve` has to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingResolution {
    Capture { player_id: PlayerId, word: Word },
    Flee,
}

/// How a cycle ended, with the log accumulated during it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedEncounter {
    pub final_state: EncounterState,
    pub word: Word,
    pub receipt: Option<CaptureReceipt>,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Encounter {
    state: EncounterState,
    creature: Option<Creature>,
    player_id: Option<PlayerId>,
    log: Vec<String>,
}

impl Encounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EncounterState {
        self.state
    }

    pub fn creature(&self) -> Option<&Creature> {
        self.creature.as_ref()
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    /// Append-only record of the current cycle.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// IDLE -> ENCOUNTERED
    pub fn start(&mut self, creature: Creature, player_id: PlayerId) -> Result<(), DomainError> {
        self.expect_state(EncounterState::Idle, "start")?;

        self.log.clear();
        self.push_log(creature.presentation());
        self.creature = Some(creature);
        self.player_id = Some(player_id);
        self.state = EncounterState::Encountered;
        Ok(())
    }

    /// ENCOUNTERED -> IN_BATTLE
    pub fn begin_battle(&mut self) -> Result<(), DomainError> {
        self.expect_state(EncounterState::Encountered, "begin battle")?;
        let instructions = self.creature()
            .map(|c| c.challenge().instructions())
            .unwrap_or_default();
        self.push_log(instructions);
        self.state = EncounterState::InBattle;
        Ok(())
    }

    /// Submit an answer while IN_BATTLE.
    ///
    /// Blank input is rejected without consuming a try. Every other input
    /// consumes one, including inputs the challenge rejects as malformed; such
    /// rejections are logged and returned as `DomainError::InvalidAttempt`, and
    /// if they used up the last try the encounter moves to LOST before the
    /// error is returned.
    pub fn submit_attempt(&mut self, input: &str) -> Result<AttemptOutcome, DomainError> {
        self.expect_state(EncounterState::InBattle, "submit attempt")?;

        if input.trim().is_empty() {
            return Err(AttemptError::EmptyInput.into());
        }

        let Some(creature) = self.creature.as_mut() else {
            return Err(DomainError::invalid_transition(self.state, "submit attempt"));
        };
        let challenge = creature.challenge_mut();
        let checked = challenge.check(input);
        let remaining = challenge.remaining_attempts();

        match checked {
            Ok(true) => {
                self.state = EncounterState::Won;
                self.push_log(format!("Attempt '{}' -> VICTORY!", input));
                Ok(AttemptOutcome::Won)
            }
            Ok(false) => Ok(self.record_miss(input, remaining, None)),
            Err(err) => {
                self.record_miss(input, remaining, Some(&err));
                Err(err.into())
            }
        }
    }

    fn record_miss(
        &mut self,
        input: &str,
        remaining: u32,
        error: Option<&AttemptError>,
    ) -> AttemptOutcome {
        if let Some(err) = error {
            self.push_log(format!("Attempt '{}' -> ERROR: {}", input, err));
        }
        if remaining > 0 {
            self.push_log(format!(
                "Attempt '{}' -> MISS... {} tries remaining",
                input, remaining
            ));
            AttemptOutcome::Retry { remaining }
        } else {
            self.state = EncounterState::Lost;
            self.push_log(format!("Attempt '{}' -> FINAL MISS! No tries left", input));
            AttemptOutcome::Lost
        }
    }

    /// What resolving from the current state requires. Legal only from WON or LOST.
    pub fn pending_resolution(&self) -> Result<PendingResolution, DomainError> {
        match (self.state, self.creature.as_ref(), self.player_id) {
            (EncounterState::Won, Some(creature), Some(player_id)) => {
                Ok(PendingResolution::Capture {
                    player_id,
                    word: creature.word().clone(),
                })
            }
            (EncounterState::Lost, Some(_), _) => Ok(PendingResolution::Flee),
            _ => Err(DomainError::invalid_transition(self.state, "resolve")),
        }
    }

    /// WON -> CAPTURED -> IDLE, once the reward has been applied.
    pub fn complete_capture(
        &mut self,
        receipt: CaptureReceipt,
    ) -> Result<FinishedEncounter, DomainError> {
        self.expect_state(EncounterState::Won, "complete capture")?;
        self.push_log(format!(
            "Capture succeeded: inventory +1 ('{}'), XP +{}, level = {}",
            receipt.word_text, receipt.xp_gained, receipt.new_level
        ));
        self.state = EncounterState::Captured;
        Ok(self.reset(Some(receipt)))
    }

    /// LOST -> FLED -> IDLE
    pub fn flee(&mut self) -> Result<FinishedEncounter, DomainError> {
        self.expect_state(EncounterState::Lost, "flee")?;
        self.push_log("The WordMon escapes in a cloud of letters...");
        self.state = EncounterState::Fled;
        Ok(self.reset(None))
    }

    fn reset(&mut self, receipt: Option<CaptureReceipt>) -> FinishedEncounter {
        let final_state = self.state;
        let word = self
            .creature
            .take()
            .map(Creature::into_word)
            .unwrap_or_else(Word::fallback);
        self.player_id = None;
        self.state = EncounterState::Idle;
        FinishedEncounter {
            final_state,
            word,
            receipt,
            log: std::mem::take(&mut self.log),
        }
    }

    fn expect_state(&self, expected: EncounterState, action: &'static str) -> Result<(), DomainError> {
        if self.state != expected {
            return Err(DomainError::invalid_transition(self.state, action));
        }
        Ok(())
    }

    fn push_log(&mut self, entry: impl Into<String>) {
        self.log.push(entry.into());
    }
}
