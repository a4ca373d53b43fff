//! Player aggregate - XP, level and captured-word inventory.
//!
//! The player is owned by a store outside the core. The domain only knows how
//! to apply a capture to one player value; stores are responsible for doing so
//! atomically with respect to other captures for the same player.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::Word;
use crate::error::DomainError;
use crate::ids::PlayerId;

/// XP needed to gain one level.
pub const XP_PER_LEVEL: u64 = 100;

/// `1 + floor(xp / 100)`, clamped to 1 for negative input.
pub fn level_from_xp(xp: i64) -> u32 {
    if xp < 0 {
        return 1;
    }
    let level = 1 + (xp as u64) / XP_PER_LEVEL;
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// # Invariants
///
/// - `level == level_from_xp(xp)` at all times
/// - inventory counts are only ever incremented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    xp: u64,
    level: u32,
    /// word text -> number of captures
    inventory: BTreeMap<String, u32>,
}

/// The delta produced by one capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureReceipt {
    pub player_id: PlayerId,
    pub word_text: String,
    pub xp_gained: u32,
    pub new_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            xp: 0,
            level: 1,
            inventory: BTreeMap::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn xp(&self) -> u64 {
        self.xp
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn inventory(&self) -> &BTreeMap<String, u32> {
        &self.inventory
    }

    /// How many times the given word has been captured.
    pub fn captured_count(&self, word_text: &str) -> u32 {
        self.inventory.get(word_text).copied().unwrap_or(0)
    }

    /// Number of distinct words captured.
    pub fn inventory_size(&self) -> usize {
        self.inventory.len()
    }

    pub fn total_captures(&self) -> u32 {
        self.inventory.values().sum()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add XP and recompute the level.
    pub fn award_xp(&mut self, points: u32) {
        self.xp = self.xp.saturating_add(u64::from(points));
        self.level = level_from_xp(i64::try_from(self.xp).unwrap_or(i64::MAX));
    }

    /// Credit a captured word: inventory +1, XP + points, level recomputed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a malformed word; the player is
    /// left untouched in that case.
    pub fn apply_capture(&mut self, word: &Word) -> Result<CaptureReceipt, DomainError> {
        if word.text.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "cannot capture word {} with empty text",
                word.id
            )));
        }
        if word.points == 0 {
            return Err(DomainError::validation(format!(
                "cannot capture '{}' worth zero points",
                word.text
            )));
        }

        let old_level = self.level;
        *self.inventory.entry(word.text.clone()).or_insert(0) += 1;
        self.award_xp(word.points);

        Ok(CaptureReceipt {
            player_id: self.id,
            word_text: word.text.clone(),
            xp_gained: word.points,
            new_xp: self.xp,
            new_level: self.level,
            leveled_up: self.level > old_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Rarity;

    #[test]
    fn level_from_xp_steps_every_hundred() {
        assert_eq!(level_from_xp(0), 1);
        assert_eq!(level_from_xp(99), 1);
        assert_eq!(level_from_xp(100), 2);
        assert_eq!(level_from_xp(250), 3);
    }

    #[test]
    fn level_from_negative_xp_clamps_to_one() {
        assert_eq!(level_from_xp(-1), 1);
        assert_eq!(level_from_xp(i64::MIN), 1);
    }

    #[test]
    fn capture_updates_inventory_xp_and_level() {
        let mut player = Player::new(PlayerId::new(), "Ash");
        let word = Word::new("l001", "dragon", Rarity::Legendary, 100);

        let receipt = player.apply_capture(&word).unwrap();

        assert_eq!(player.captured_count("dragon"), 1);
        assert_eq!(player.xp(), 100);
        assert_eq!(player.level(), 2);
        assert!(receipt.leveled_up);
        assert_eq!(receipt.xp_gained, 100);
    }

    #[test]
    fn repeated_captures_accumulate() {
        let mut player = Player::new(PlayerId::new(), "Ash");
        let chat = Word::new("c001", "chat", Rarity::Common, 5);
        let eau = Word::new("c005", "eau", Rarity::Common, 5);

        player.apply_capture(&chat).unwrap();
        player.apply_capture(&chat).unwrap();
        let receipt = player.apply_capture(&eau).unwrap();

        assert_eq!(player.captured_count("chat"), 2);
        assert_eq!(player.inventory_size(), 2);
        assert_eq!(player.total_captures(), 3);
        assert!(!receipt.leveled_up);
    }

    #[test]
    fn malformed_word_leaves_player_untouched() {
        let mut player = Player::new(PlayerId::new(), "Ash");
        let empty = Word::new("empty", "", Rarity::Common, 5);

        let result = player.apply_capture(&empty);

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(player.xp(), 0);
        assert_eq!(player.total_captures(), 0);
    }
}
