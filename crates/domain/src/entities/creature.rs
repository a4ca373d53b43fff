//! Creature - a word paired with the challenge guarding it.

use super::{Challenge, Word};
use crate::error::DomainError;
use crate::value_objects::Rarity;

/// A transient word-monster, created at encounter/spawn time and discarded
/// after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creature {
    word: Word,
    challenge: Challenge,
}

impl Creature {
    /// Wrap a word into a creature.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConstructionDefect` when the word breaks its
    /// invariants. That indicates corrupted upstream data and must not be
    /// swallowed.
    pub fn new(word: Word) -> Result<Self, DomainError> {
        word.validate()?;
        let challenge = Challenge::for_word(&word);
        Ok(Self { word, challenge })
    }

    pub fn word(&self) -> &Word {
        &self.word
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn challenge_mut(&mut self) -> &mut Challenge {
        &mut self.challenge
    }

    pub fn into_word(self) -> Word {
        self.word
    }

    /// Human-readable announcement, flavored by tier.
    pub fn presentation(&self) -> String {
        let flavor = match self.word.rarity {
            Rarity::Common => "An ordinary WordMon",
            Rarity::Rare => "A rare WordMon shimmers faintly as it",
            Rarity::Legendary => "A legendary WordMon radiates power as it",
        };
        format!(
            "{} appears: '{}' [{}] ({} points)",
            flavor, self.word.text, self.word.rarity, self.word.points
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_valid_word_with_matching_challenge() {
        let creature = Creature::new(Word::new("l001", "dragon", Rarity::Legendary, 100)).unwrap();
        assert_eq!(creature.word().text, "dragon");
        assert_eq!(creature.challenge().max_attempts(), 1);
        assert!(creature.presentation().contains("legendary"));
    }

    #[test]
    fn refuses_empty_text() {
        let result = Creature::new(Word::new("empty", "", Rarity::Common, 5));
        assert!(matches!(result, Err(DomainError::ConstructionDefect(_))));
    }

    #[test]
    fn refuses_zero_points() {
        let result = Creature::new(Word::new("invalid", "test", Rarity::Common, 0));
        assert!(matches!(result, Err(DomainError::ConstructionDefect(_))));
    }
}
