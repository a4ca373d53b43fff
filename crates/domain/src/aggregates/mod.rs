//! Aggregates: entities with lifecycle and invariants.

mod encounter;
mod player;

pub use encounter::{
    AttemptOutcome, Encounter, EncounterState, FinishedEncounter, PendingResolution,
};
pub use player::{level_from_xp, CaptureReceipt, Player, XP_PER_LEVEL};
