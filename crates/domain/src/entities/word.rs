//! Word entity - the content behind every creature.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::WordId;
use crate::value_objects::Rarity;

/// Identifier of the sentinel word yielded when every pool is empty.
pub const FALLBACK_WORD_ID: &str = "fallback";

/// An immutable catalog word.
///
/// # Invariants
///
/// - `text` is non-empty
/// - `points` is strictly positive
///
/// The fields are public because words are plain data moved between the
/// catalog, the store and the arena. [`Word::validate`] checks the invariants;
/// [`Creature::new`](super::Creature::new) refuses words that fail it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub text: String,
    pub rarity: Rarity,
    pub points: u32,
}

impl Word {
    pub fn new(id: impl Into<WordId>, text: impl Into<String>, rarity: Rarity, points: u32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            rarity,
            points,
        }
    }

    /// The sentinel spawned when no pool has any content.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_WORD_ID, "wordmon", Rarity::Common, 1)
    }

    pub fn is_fallback(&self) -> bool {
        self.id.as_str() == FALLBACK_WORD_ID
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.text.trim().is_empty() {
            return Err(DomainError::construction_defect(format!(
                "word {} has empty text",
                self.id
            )));
        }
        if self.points == 0 {
            return Err(DomainError::construction_defect(format!(
                "word '{}' has non-positive points",
                self.text
            )));
        }
        Ok(())
    }
}

impl From<String> for WordId {
    fn from(value: String) -> Self {
        WordId::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_a_valid_one_point_word() {
        let word = Word::fallback();
        assert!(word.is_fallback());
        assert_eq!(word.points, 1);
        assert!(word.validate().is_ok());
    }

    #[test]
    fn blank_text_is_a_defect() {
        let word = Word::new("c999", "   ", Rarity::Common, 5);
        assert!(matches!(
            word.validate(),
            Err(DomainError::ConstructionDefect(_))
        ));
    }

    #[test]
    fn zero_points_is_a_defect() {
        let word = Word::new("c999", "test", Rarity::Common, 0);
        assert!(matches!(
            word.validate(),
            Err(DomainError::ConstructionDefect(_))
        ));
    }
}
