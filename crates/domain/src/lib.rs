//! WordMon domain.
//!
//! Pure game rules: words and their rarity, the anagram challenge, creatures,
//! players and the single-player encounter state machine. Nothing here is
//! async and nothing here draws random numbers; the engine injects both.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use aggregates::{
    level_from_xp, AttemptOutcome, CaptureReceipt, Encounter, EncounterState, FinishedEncounter,
    PendingResolution, Player, XP_PER_LEVEL,
};
pub use entities::{
    AnagramChallenge, Challenge, Creature, Word, WordCatalog, WordEntry, FALLBACK_WORD_ID,
};
pub use error::{AttemptError, DomainError};
pub use ids::{PlayerId, SpawnId, WordId};
pub use value_objects::{Rarity, RarityWeights, XpRewards};
