//! Rarity-weighted word generator.
//!
//! Rolls in `0..100`, maps the roll onto the catalog's cumulative weights and
//! picks uniformly inside the selected tier. An empty tier falls back to the
//! first non-empty one; an empty catalog yields [`Word::fallback`]. Drawing
//! never fails and never blocks on content.

use std::sync::Arc;

use wordmon_domain::{RarityWeights, Word, WordCatalog};

use crate::infrastructure::ports::RandomPort;

pub struct WordGenerator {
    catalog: Arc<WordCatalog>,
    random: Arc<dyn RandomPort>,
}

impl WordGenerator {
    pub fn new(catalog: Arc<WordCatalog>, random: Arc<dyn RandomPort>) -> Self {
        Self { catalog, random }
    }

    pub fn catalog(&self) -> &WordCatalog {
        &self.catalog
    }

    /// Draw one word.
    pub fn spawn(&self) -> Word {
        let max_roll = i32::try_from(RarityWeights::TOTAL - 1).unwrap_or(i32::MAX);
        let roll = u32::try_from(self.random.gen_range(0, max_roll)).unwrap_or(0);
        let rarity = self.catalog.weights().tier_for_roll(roll);

        let Some(pool) = self.catalog.pool_for_draw(rarity) else {
            tracing::warn!("Word catalog is empty, spawning the fallback word");
            return Word::fallback();
        };

        let last = i32::try_from(pool.len() - 1).unwrap_or(i32::MAX);
        let index = usize::try_from(self.random.gen_range(0, last)).unwrap_or(0);
        pool.get(index).cloned().unwrap_or_else(Word::fallback)
    }
}
