//! Per-tier spawn weights and XP rewards.

use serde::{Deserialize, Serialize};

use super::Rarity;
use crate::error::DomainError;

/// Spawn weights per tier, as integer percentages.
///
/// The sum is validated at configuration time ([`RarityWeights::validate`]);
/// [`RarityWeights::tier_for_roll`] assumes it has already been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityWeights {
    pub common: u32,
    pub rare: u32,
    pub legendary: u32,
}

impl RarityWeights {
    pub const TOTAL: u32 = 100;

    pub fn new(common: u32, rare: u32, legendary: u32) -> Self {
        Self {
            common,
            rare,
            legendary,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let sum = u64::from(self.common) + u64::from(self.rare) + u64::from(self.legendary);
        if sum != u64::from(Self::TOTAL) {
            return Err(DomainError::validation(format!(
                "rarity weights must sum to {}, got {}",
                Self::TOTAL,
                sum
            )));
        }
        Ok(())
    }

    /// Select the tier whose cumulative threshold `roll` (in `0..100`) falls into.
    pub fn tier_for_roll(&self, roll: u32) -> Rarity {
        if roll < self.common {
            Rarity::Common
        } else if roll < self.common.saturating_add(self.rare) {
            Rarity::Rare
        } else {
            Rarity::Legendary
        }
    }

    pub fn weight(&self, rarity: Rarity) -> u32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Legendary => self.legendary,
        }
    }
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self::new(80, 18, 2)
    }
}

/// XP awarded per tier on capture. Becomes the `points` of every dictionary word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpRewards {
    pub common: u32,
    pub rare: u32,
    pub legendary: u32,
}

impl XpRewards {
    pub fn new(common: u32, rare: u32, legendary: u32) -> Self {
        Self {
            common,
            rare,
            legendary,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for rarity in Rarity::ALL {
            if self.for_rarity(rarity) == 0 {
                return Err(DomainError::validation(format!(
                    "xp reward for {} must be strictly positive",
                    rarity
                )));
            }
        }
        Ok(())
    }

    pub fn for_rarity(&self, rarity: Rarity) -> u32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Legendary => self.legendary,
        }
    }
}

impl Default for XpRewards {
    fn default() -> Self {
        Self::new(5, 20, 100)
    }
}
