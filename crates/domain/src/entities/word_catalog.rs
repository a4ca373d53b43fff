//! Word catalog - the immutable word pools per rarity tier.
//!
//! A catalog is built once at startup (from the built-in pools or a dictionary)
//! and then shared read-only, so draws never need to synchronize on it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::Word;
use crate::error::DomainError;
use crate::value_objects::{Rarity, RarityWeights, XpRewards};

/// One dictionary entry as stored on disk: `{"id", "text", "rarity"}`.
///
/// Points are not part of the dictionary; they come from [`XpRewards`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub id: String,
    pub text: String,
    pub rarity: String,
}

#[derive(Debug, Clone, Default)]
pub struct WordCatalog {
    weights: RarityWeights,
    common: Vec<Word>,
    rare: Vec<Word>,
    legendary: Vec<Word>,
}

impl WordCatalog {
    /// An empty catalog. Every draw from it yields [`Word::fallback`].
    pub fn new(weights: RarityWeights) -> Self {
        Self {
            weights,
            common: Vec::new(),
            rare: Vec::new(),
            legendary: Vec::new(),
        }
    }

    /// The built-in pools, five words per tier.
    pub fn builtin(weights: RarityWeights, rewards: XpRewards) -> Self {
        const COMMON: [(&str, &str); 5] = [
            ("c001", "chat"),
            ("c002", "chien"),
            ("c003", "maison"),
            ("c004", "soleil"),
            ("c005", "eau"),
        ];
        const RARE: [(&str, &str); 5] = [
            ("r001", "licorne"),
            ("r002", "phoenix"),
            ("r003", "cristal"),
            ("r004", "tempête"),
            ("r005", "étoile"),
        ];
        const LEGENDARY: [(&str, &str); 5] = [
            ("l001", "dragon"),
            ("l002", "excalibur"),
            ("l003", "atlantide"),
            ("l004", "immortel"),
            ("l005", "cosmos"),
        ];

        let mut catalog = Self::new(weights);
        for (rarity, pool) in [
            (Rarity::Common, COMMON),
            (Rarity::Rare, RARE),
            (Rarity::Legendary, LEGENDARY),
        ] {
            for (id, text) in pool {
                catalog.push(Word::new(id, text, rarity, rewards.for_rarity(rarity)));
            }
        }
        catalog
    }

    /// Build a catalog from dictionary entries.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` on a duplicated id, blank text, text
    /// containing whitespace or an unknown rarity.
    pub fn from_entries(
        entries: &[WordEntry],
        weights: RarityWeights,
        rewards: XpRewards,
    ) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        let mut catalog = Self::new(weights);

        for entry in entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(DomainError::validation(format!(
                    "duplicated word id: {}",
                    entry.id
                )));
            }
            if entry.text.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "empty text for word id: {}",
                    entry.id
                )));
            }
            if entry.text.chars().any(char::is_whitespace) {
                return Err(DomainError::validation(format!(
                    "text contains whitespace for word id: {}",
                    entry.id
                )));
            }
            let rarity: Rarity = entry.rarity.parse().map_err(|_| {
                DomainError::validation(format!(
                    "unknown rarity '{}' for word id: {}",
                    entry.rarity, entry.id
                ))
            })?;

            catalog.push(Word::new(
                entry.id.as_str(),
                entry.text.as_str(),
                rarity,
                rewards.for_rarity(rarity),
            ));
        }

        Ok(catalog)
    }

    /// Add a word to the pool of its tier. Only used while building.
    pub fn with_word(mut self, word: Word) -> Self {
        self.push(word);
        self
    }

    fn push(&mut self, word: Word) {
        match word.rarity {
            Rarity::Common => self.common.push(word),
            Rarity::Rare => self.rare.push(word),
            Rarity::Legendary => self.legendary.push(word),
        }
    }

    pub fn weights(&self) -> RarityWeights {
        self.weights
    }

    pub fn pool(&self, rarity: Rarity) -> &[Word] {
        match rarity {
            Rarity::Common => &self.common,
            Rarity::Rare => &self.rare,
            Rarity::Legendary => &self.legendary,
        }
    }

    /// The pool to draw from for `rarity`: that tier's pool if non-empty,
    /// otherwise the first non-empty pool in Common, Rare, Legendary order.
    /// `None` when the whole catalog is empty.
    pub fn pool_for_draw(&self, rarity: Rarity) -> Option<&[Word]> {
        let selected = self.pool(rarity);
        if !selected.is_empty() {
            return Some(selected);
        }
        Rarity::ALL
            .into_iter()
            .map(|r| self.pool(r))
            .find(|pool| !pool.is_empty())
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.common
            .iter()
            .chain(self.rare.iter())
            .chain(self.legendary.iter())
    }

    pub fn len(&self) -> usize {
        self.common.len() + self.rare.len() + self.legendary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, text: &str, rarity: &str) -> WordEntry {
        WordEntry {
            id: id.to_string(),
            text: text.to_string(),
            rarity: rarity.to_string(),
        }
    }

    #[test]
    fn builtin_has_five_words_per_tier() {
        let catalog = WordCatalog::builtin(RarityWeights::default(), XpRewards::default());
        for rarity in Rarity::ALL {
            assert_eq!(catalog.pool(rarity).len(), 5);
        }
        assert!(catalog
            .pool(Rarity::Legendary)
            .iter()
            .all(|w| w.points == 100));
    }

    #[test]
    fn dictionary_points_come_from_rewards() {
        let catalog = WordCatalog::from_entries(
            &[entry("c1", "chat", "Common"), entry("l1", "dragon", "Legendary")],
            RarityWeights::default(),
            XpRewards::new(7, 30, 250),
        )
        .unwrap();
        assert_eq!(catalog.pool(Rarity::Common)[0].points, 7);
        assert_eq!(catalog.pool(Rarity::Legendary)[0].points, 250);
        assert!(catalog.pool(Rarity::Rare).is_empty());
    }

    #[test]
    fn dictionary_rejects_duplicates_and_bad_entries() {
        let defaults = (RarityWeights::default(), XpRewards::default());
        let dup = [entry("c1", "chat", "common"), entry("c1", "chien", "common")];
        assert!(WordCatalog::from_entries(&dup, defaults.0, defaults.1).is_err());

        let spaced = [entry("c1", "le chat", "common")];
        assert!(WordCatalog::from_entries(&spaced, defaults.0, defaults.1).is_err());

        let blank = [entry("c1", " ", "common")];
        assert!(WordCatalog::from_entries(&blank, defaults.0, defaults.1).is_err());

        let unknown = [entry("c1", "chat", "mythic")];
        assert!(WordCatalog::from_entries(&unknown, defaults.0, defaults.1).is_err());
    }

    #[test]
    fn empty_tier_falls_back_in_priority_order() {
        let catalog = WordCatalog::new(RarityWeights::default())
            .with_word(Word::new("r1", "licorne", Rarity::Rare, 20))
            .with_word(Word::new("l1", "dragon", Rarity::Legendary, 100));

        let pool = catalog.pool_for_draw(Rarity::Common).unwrap();
        assert_eq!(pool[0].rarity, Rarity::Rare);

        let pool = catalog.pool_for_draw(Rarity::Legendary).unwrap();
        assert_eq!(pool[0].rarity, Rarity::Legendary);
    }

    #[test]
    fn empty_catalog_has_nothing_to_draw() {
        let catalog = WordCatalog::new(RarityWeights::default());
        assert!(catalog.is_empty());
        assert!(catalog.pool_for_draw(Rarity::Common).is_none());
    }
}
