//! Challenges a creature poses to the player.
//!
//! [`Challenge`] is a closed set of variants. Only [`AnagramChallenge`] exists
//! today; the configuration already reserves a "fill-in-the-blank" variant that
//! has no behavior yet.

use serde::{Deserialize, Serialize};

use super::Word;
use crate::error::AttemptError;
use crate::value_objects::Rarity;

/// A stateful per-creature challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Challenge {
    Anagram(AnagramChallenge),
}

impl Challenge {
    /// The default challenge for a word.
    pub fn for_word(word: &Word) -> Self {
        Self::Anagram(AnagramChallenge::new(word))
    }

    pub fn instructions(&self) -> String {
        match self {
            Self::Anagram(c) => c.instructions(),
        }
    }

    /// Evaluate an attempt. Every call consumes one try, whatever the outcome.
    ///
    /// `Ok(false)` is an ordinary wrong answer, not an error.
    pub fn check(&mut self, attempt: &str) -> Result<bool, AttemptError> {
        match self {
            Self::Anagram(c) => c.check(attempt),
        }
    }

    /// Number of tries this kind of challenge grants for a tier.
    pub fn difficulty_for(&self, rarity: Rarity) -> u32 {
        match self {
            Self::Anagram(_) => AnagramChallenge::difficulty_for(rarity),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::Anagram(c) => c.max_attempts,
        }
    }

    pub fn tries_used(&self) -> u32 {
        match self {
            Self::Anagram(c) => c.tries_used,
        }
    }

    pub fn has_attempts_left(&self) -> bool {
        self.tries_used() < self.max_attempts()
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts().saturating_sub(self.tries_used())
    }
}

/// "Give a rearrangement of the letters of the target word."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnagramChallenge {
    pub target_text: String,
    pub rarity: Rarity,
    pub max_attempts: u32,
    pub tries_used: u32,
}

impl AnagramChallenge {
    pub fn new(word: &Word) -> Self {
        Self {
            target_text: word.text.clone(),
            rarity: word.rarity,
            max_attempts: Self::difficulty_for(word.rarity),
            tries_used: 0,
        }
    }

    pub fn difficulty_for(rarity: Rarity) -> u32 {
        rarity.max_attempts()
    }

    pub fn instructions(&self) -> String {
        format!(
            "Challenge: give a valid anagram of the word '{}'",
            self.target_text
        )
    }

    /// Validation order short-circuits: empty, non-letter, identical, length,
    /// then letter multiset comparison.
    pub fn check(&mut self, attempt: &str) -> Result<bool, AttemptError> {
        self.tries_used += 1;

        let attempt = attempt.trim();
        if attempt.is_empty() {
            return Err(AttemptError::EmptyInput);
        }

        let attempt = attempt.to_lowercase();
        let target = self.target_text.trim().to_lowercase();

        if !attempt.chars().all(char::is_alphabetic) {
            return Err(AttemptError::NonLetterCharacter { input: attempt });
        }

        if attempt == target {
            return Err(AttemptError::IdenticalToTarget);
        }

        Ok(is_anagram(&attempt, &target))
    }
}

/// Multiset equality of code points.
fn is_anagram(a: &str, b: &str) -> bool {
    let mut a: Vec<char> = a.chars().collect();
    let mut b: Vec<char> = b.chars().collect();
    if a.len() != b.len() {
        return false;
    }
    a.sort_unstable();
    b.sort_unstable();
    a == b
}
