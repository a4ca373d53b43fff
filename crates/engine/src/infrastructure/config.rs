//! Game configuration.
//!
//! Defaults, then an optional JSON file (`WORDMON_CONFIG_PATH`), then
//! environment overrides, then validation. The word dictionary is a separate
//! optional JSON file (`WORDMON_WORDS_PATH`); without it the built-in pools
//! are used.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wordmon_domain::{DomainError, Rarity, RarityWeights, WordCatalog, WordEntry, XpRewards};

pub const CONFIG_PATH_ENV: &str = "WORDMON_CONFIG_PATH";
pub const WORDS_PATH_ENV: &str = "WORDMON_WORDS_PATH";
pub const SPAWN_INTERVAL_ENV: &str = "WORDMON_SPAWN_INTERVAL";
pub const AUTO_FLEE_ENV: &str = "WORDMON_AUTO_FLEE";

/// A dictionary must give every tier at least this many words.
pub const MIN_WORDS_PER_RARITY: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<DomainError> for ConfigError {
    fn from(err: DomainError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Main game configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameConfig {
    pub game: GameInfo,
    pub rarity_weights: RarityWeights,
    pub xp_rewards: XpRewards,
    pub spawner: SpawnerConfig,
    /// Reserved. The level rule is fixed at one level per 100 XP.
    pub level: LevelConfig,
    pub challenges: ChallengesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameInfo {
    pub name: String,
    pub version: String,
}

impl Default for GameInfo {
    fn default() -> Self {
        Self {
            name: "WordMon Go".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub interval_seconds: u64,
    pub auto_flee_after_seconds: u64,
}

impl SpawnerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn flee_after(&self) -> Duration {
        Duration::from_secs(self.auto_flee_after_seconds)
    }
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 10,
            auto_flee_after_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub base: u32,
    pub xp_per_level: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            base: 1,
            xp_per_level: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChallengesConfig {
    pub anagram: AnagramConfig,
    /// Fill-in-the-blank challenge settings. Parsed and kept, never used.
    pub a_trou: ATrouConfig,
}

/// Informational only: the anagram rule does not enforce minimum lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnagramConfig {
    pub min_len_by_rarity: BTreeMap<Rarity, u32>,
    pub must_differ_from_source: bool,
}

impl Default for AnagramConfig {
    fn default() -> Self {
        Self {
            min_len_by_rarity: BTreeMap::from([
                (Rarity::Common, 3),
                (Rarity::Rare, 5),
                (Rarity::Legendary, 7),
            ]),
            must_differ_from_source: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ATrouConfig {
    pub revealed_letters: BTreeMap<Rarity, u32>,
    pub max_attempts: u32,
}

impl Default for ATrouConfig {
    fn default() -> Self {
        Self {
            revealed_letters: BTreeMap::from([
                (Rarity::Common, 2),
                (Rarity::Rare, 1),
                (Rarity::Legendary, 0),
            ]),
            max_attempts: 4,
        }
    }
}

impl GameConfig {
    /// Load configuration from the environment: the file named by
    /// `WORDMON_CONFIG_PATH` if set, then the env overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;

        tracing::info!(
            game = %config.game.name,
            version = %config.game.version,
            common = config.rarity_weights.common,
            rare = config.rarity_weights.rare,
            legendary = config.rarity_weights.legendary,
            "Game configuration loaded"
        );
        Ok(config)
    }

    /// Parse a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `WORDMON_SPAWN_INTERVAL` / `WORDMON_AUTO_FLEE` (seconds).
    /// Unparseable values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = seconds_override(&lookup, SPAWN_INTERVAL_ENV) {
            self.spawner.interval_seconds = value;
        }
        if let Some(value) = seconds_override(&lookup, AUTO_FLEE_ENV) {
            self.spawner.auto_flee_after_seconds = value;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rarity_weights.validate()?;
        self.xp_rewards.validate()?;
        if self.spawner.interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "spawner.interval_seconds must be positive".to_string(),
            ));
        }
        if self.spawner.auto_flee_after_seconds == 0 {
            return Err(ConfigError::Invalid(
                "spawner.auto_flee_after_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The word catalog: the dictionary named by `WORDMON_WORDS_PATH` if set,
    /// the built-in pools otherwise.
    pub fn load_catalog(&self) -> Result<WordCatalog, ConfigError> {
        match env::var(WORDS_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => self.catalog_from_file(path.trim()),
            _ => {
                tracing::info!("No word dictionary configured, using built-in pools");
                Ok(WordCatalog::builtin(self.rarity_weights, self.xp_rewards))
            }
        }
    }

    /// Build a catalog from a JSON dictionary `[{"id", "text", "rarity"}]`.
    pub fn catalog_from_file(&self, path: impl AsRef<Path>) -> Result<WordCatalog, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<WordEntry> =
            serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let catalog = WordCatalog::from_entries(&entries, self.rarity_weights, self.xp_rewards)?;
        for rarity in Rarity::ALL {
            let count = catalog.pool(rarity).len();
            if count < MIN_WORDS_PER_RARITY {
                return Err(ConfigError::Invalid(format!(
                    "at least {} {} words required, found {}",
                    MIN_WORDS_PER_RARITY, rarity, count
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            common = catalog.pool(Rarity::Common).len(),
            rare = catalog.pool(Rarity::Rare).len(),
            legendary = catalog.pool(Rarity::Legendary).len(),
            "Word dictionary loaded"
        );
        Ok(catalog)
    }
}

fn seconds_override(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => {
            tracing::info!(key, value, "Configuration override from environment");
            Some(value)
        }
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable configuration override");
            None
        }
    }
}
