//! Configuration management (`config.toml`)
//!
//! Settings are stored in TOML format in the platform-specific config
//! directory. Every field has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::replay::DecodeOptions;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Replay consistency checks
    #[serde(default)]
    pub replay: ReplayConfig,
    /// Level publication policy
    #[serde(default)]
    pub publish: PublishConfig,
    /// Leaderboard paging
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    /// Ledger storage
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Allowed gap between declared time and recorded frames (default: 0.25)
    #[serde(default = "default_tolerance")]
    pub duration_tolerance_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Minimum seconds between two uploads by the same author (default: 60)
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    /// Maximum title length in characters (default: 49)
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,
    /// Maximum description length in characters (default: 256)
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Largest page a caller may request (default: 20)
    #[serde(default = "default_page_size")]
    pub max_page_size: u32,
    /// Page size when the caller does not ask for one (default: 20)
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// What happens to scores tagged with an outdated level version
    #[serde(default)]
    pub retention: RetentionPolicy,
    /// Snapshot file for the ledger (default: `<data_dir>/ledger.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

/// Fate of score entries whose level version has been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep them for history; they just stop ranking
    #[default]
    KeepAll,
    /// Delete them when their level is overwritten
    PurgeSuperseded,
}

fn default_tolerance() -> f64 {
    crate::replay::binary::DEFAULT_DURATION_TOLERANCE_SECS
}
fn default_cooldown() -> u64 {
    60
}
fn default_max_title_len() -> usize {
    49
}
fn default_max_description_len() -> usize {
    256
}
fn default_page_size() -> u32 {
    20
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            duration_tolerance_secs: default_tolerance(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            max_title_len: default_max_title_len(),
            max_description_len: default_max_description_len(),
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_page_size(),
            default_page_size: default_page_size(),
        }
    }
}

impl ReplayConfig {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            duration_tolerance_secs: self.duration_tolerance_secs,
        }
    }
}

/// Errors loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.replay.duration_tolerance_secs;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "replay.duration_tolerance_secs must be a non-negative number",
            ));
        }
        if self.leaderboard.max_page_size == 0 {
            return Err(ConfigError::Invalid("leaderboard.max_page_size must be at least 1"));
        }
        if self.leaderboard.default_page_size == 0
            || self.leaderboard.default_page_size > self.leaderboard.max_page_size
        {
            return Err(ConfigError::Invalid(
                "leaderboard.default_page_size must be between 1 and max_page_size",
            ));
        }
        if self.publish.max_title_len == 0 {
            return Err(ConfigError::Invalid("publish.max_title_len must be at least 1"));
        }
        Ok(())
    }

    /// Where the ledger snapshot lives.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.storage
            .snapshot_path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("ledger.json")))
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\tilerun\config`
/// On macOS: `~/Library/Application Support/io.tilerun.tilerun`
/// On Linux: `~/.config/tilerun`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.tilerun", "", "tilerun")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory for the ledger snapshot.
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.tilerun", "", "tilerun")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads `config.toml` from the platform's configuration directory.
///
/// A missing file yields defaults; a file that exists but does not parse is
/// an error.
pub fn load() -> Result<Config, ConfigError> {
    match config_dir() {
        Some(dir) => load_from(&dir.join("config.toml")),
        None => Ok(Config::default()),
    }
}

/// Loads configuration from an explicit path, with the same rules as [`load`].
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Config::from_toml_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

/// Saves the configuration to `path`, creating parent directories.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
