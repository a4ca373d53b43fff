//! Rarity tiers.
//!
//! Rarity controls spawn probability (via [`RarityWeights`]), the XP reward
//! (via [`XpRewards`]) and the number of tries a challenge allows.
//!
//! [`RarityWeights`]: super::RarityWeights
//! [`XpRewards`]: super::XpRewards

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
}

impl Rarity {
    /// All tiers in fallback priority order.
    pub const ALL: [Rarity; 3] = [Rarity::Common, Rarity::Rare, Rarity::Legendary];

    /// Number of tries a challenge grants for this tier.
    pub fn max_attempts(self) -> u32 {
        match self {
            Self::Common => 3,
            Self::Rare => 2,
            Self::Legendary => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "common" => Ok(Self::Common),
            "rare" => Ok(Self::Rare),
            "legendary" => Ok(Self::Legendary),
            _ => Err(DomainError::parse(format!("Unknown rarity: {}", s))),
        }
    }
}
