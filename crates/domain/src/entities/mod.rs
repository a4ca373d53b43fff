//! Domain entities.

mod challenge;
mod creature;
mod word;
mod word_catalog;

pub use challenge::{AnagramChallenge, Challenge};
pub use creature::Creature;
pub use word::{Word, FALLBACK_WORD_ID};
pub use word_catalog::{WordCatalog, WordEntry};
