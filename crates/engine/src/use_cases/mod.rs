//! Use cases - User story orchestration.
//!
//! - `generator` - rarity-weighted word draws
//! - `encounter` - one player's encounter with one creature
//! - `arena` - concurrent spawning, arbitration and simulated challengers
//! - `game` - the request-facing service over all of the above

pub mod arena;
pub mod encounter;
pub mod game;
pub mod generator;

pub use arena::{Arena, ArenaConfig, ChallengerProfile, Contender};
pub use encounter::{EncounterError, PlayEncounter};
pub use game::{GameError, GameService, GameStatus};
pub use generator::WordGenerator;
