//! Value objects: immutable, compared by value.

mod rarity;
mod rarity_weights;

pub use rarity::Rarity;
pub use rarity_weights::{RarityWeights, XpRewards};
