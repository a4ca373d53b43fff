//! Single-player encounter use case.
//!
//! Drives one player's [`Encounter`] with creatures drawn from the word
//! generator, and applies the capture reward through the player store when
//! the encounter is resolved.

use std::sync::Arc;

use wordmon_domain::{
    AttemptOutcome, Creature, DomainError, Encounter, EncounterState, FinishedEncounter,
    PendingResolution, PlayerId,
};

use crate::infrastructure::ports::{PlayerRepo, RepoError};

use super::generator::WordGenerator;

/// Errors that can occur while playing an encounter.
#[derive(Debug, thiserror::Error)]
pub enum EncounterError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// The reward could not be stored. The encounter is still WON and
    /// `resolve` may be called again.
    #[error("Reward application failed: {0}")]
    RewardApplicationFailed(#[source] RepoError),
}

pub struct PlayEncounter {
    generator: Arc<WordGenerator>,
    players: Arc<dyn PlayerRepo>,
}

impl PlayEncounter {
    pub fn new(generator: Arc<WordGenerator>, players: Arc<dyn PlayerRepo>) -> Self {
        Self { generator, players }
    }

    /// IDLE -> ENCOUNTERED with a freshly drawn creature.
    pub fn start(
        &self,
        encounter: &mut Encounter,
        player_id: PlayerId,
    ) -> Result<(), EncounterError> {
        if encounter.state() != EncounterState::Idle {
            return Err(DomainError::invalid_transition(encounter.state(), "start").into());
        }
        let word = self.generator.spawn();
        let creature = Creature::new(word).inspect_err(|e| {
            tracing::error!(error = %e, "Generated word failed creature construction");
        })?;

        tracing::info!(
            player_id = %player_id,
            word = %creature.word().text,
            rarity = %creature.word().rarity,
            "Encounter started"
        );
        encounter.start(creature, player_id)?;
        Ok(())
    }

    pub fn begin_battle(&self, encounter: &mut Encounter) -> Result<(), EncounterError> {
        Ok(encounter.begin_battle()?)
    }

    pub fn submit(
        &self,
        encounter: &mut Encounter,
        answer: &str,
    ) -> Result<AttemptOutcome, EncounterError> {
        let outcome = encounter.submit_attempt(answer)?;
        tracing::debug!(answer, ?outcome, state = %encounter.state(), "Attempt submitted");
        Ok(outcome)
    }

    /// WON -> CAPTURED -> IDLE or LOST -> FLED -> IDLE.
    ///
    /// Returns the finished cycle with its log. On a reward failure the
    /// encounter is left WON so the call can be retried.
    pub async fn resolve(
        &self,
        encounter: &mut Encounter,
    ) -> Result<FinishedEncounter, EncounterError> {
        match encounter.pending_resolution()? {
            PendingResolution::Capture { player_id, word } => {
                let receipt = self
                    .players
                    .apply_capture(player_id, &word.id)
                    .await
                    .map_err(|e| {
                        tracing::warn!(
                            player_id = %player_id,
                            word = %word.text,
                            error = %e,
                            "Failed to apply capture reward"
                        );
                        EncounterError::RewardApplicationFailed(e)
                    })?;

                tracing::info!(
                    player_id = %player_id,
                    word = %word.text,
                    xp_gained = receipt.xp_gained,
                    new_level = receipt.new_level,
                    "WordMon captured"
                );
                Ok(encounter.complete_capture(receipt)?)
            }
            PendingResolution::Flee => {
                let finished = encounter.flee()?;
                tracing::info!(word = %finished.word.text, "WordMon fled");
                Ok(finished)
            }
        }
    }
}
