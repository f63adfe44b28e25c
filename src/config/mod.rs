//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cache::DebounceTiming;
use crate::models::DraftChoiceKind;
use crate::parse_duration;
use crate::stats::StatsSettings;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// A team composition role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Identifier used in game compositions
    pub id: String,
}

/// Stats configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Draft steps of a standard game, e.g. `["captainRole", "playerPick"]`
    #[serde(default)]
    pub draft_order: Vec<DraftChoiceKind>,

    /// Keep ratings out of listings and pages
    #[serde(default)]
    pub hide_ratings: bool,

    /// Restriction duration labels offered on player pages
    #[serde(default = "default_restriction_durations")]
    pub restriction_durations: Vec<String>,

    /// Roles counted per player, in display order
    #[serde(default = "default_roles")]
    pub roles: Vec<RoleConfig>,
}

fn default_roles() -> Vec<RoleConfig> {
    vec![RoleConfig {
        id: "player".to_string(),
    }]
}

fn default_restriction_durations() -> Vec<String> {
    ["1 day", "1 week", "1 month", "forever"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            draft_order: Vec::new(),
            hide_ratings: false,
            restriction_durations: default_restriction_durations(),
            roles: default_roles(),
        }
    }
}

impl StatsConfig {
    /// Number of `playerPick` steps in the standard draft.
    pub fn draft_picks(&self) -> u32 {
        self.draft_order
            .iter()
            .filter(|kind| **kind == DraftChoiceKind::PlayerPick)
            .count() as u32
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Quiet period before list projections are rebuilt
    #[serde(default = "default_debounce_wait")]
    pub debounce_wait: String,

    /// Longest a list rebuild may be deferred under constant changes
    #[serde(default = "default_debounce_max_wait")]
    pub debounce_max_wait: String,
}

fn default_debounce_wait() -> String {
    "5s".to_string()
}

fn default_debounce_max_wait() -> String {
    "60s".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            debounce_wait: default_debounce_wait(),
            debounce_max_wait: default_debounce_max_wait(),
        }
    }
}

impl CacheConfig {
    pub fn debounce_timing(&self) -> Result<DebounceTiming, ConfigError> {
        let wait = parse_config_duration("debounce_wait", &self.debounce_wait)?;
        let max_wait = parse_config_duration("debounce_max_wait", &self.debounce_max_wait)?;
        Ok(DebounceTiming::new(wait, max_wait))
    }
}

fn parse_config_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).ok_or_else(|| {
        ConfigError::ValidationError(format!("{} is not a valid duration: {:?}", field, value))
    })
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub stats: StatsConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            stats: StatsConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        let wait = parse_config_duration("debounce_wait", &self.cache.debounce_wait)?;
        let max_wait = parse_config_duration("debounce_max_wait", &self.cache.debounce_max_wait)?;
        if wait.is_zero() {
            return Err(ConfigError::ValidationError(
                "debounce_wait must be greater than 0".to_string(),
            ));
        }
        if max_wait < wait {
            return Err(ConfigError::ValidationError(
                "debounce_max_wait must not be shorter than debounce_wait".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for role in &self.stats.roles {
            if role.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Role id must not be empty".to_string(),
                ));
            }
            if !seen.insert(role.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate role id: {}",
                    role.id
                )));
            }
        }

        Ok(())
    }

    /// Settings for the stats coordinator.
    pub fn stats_settings(&self) -> Result<StatsSettings, ConfigError> {
        Ok(StatsSettings {
            roles: self.stats.roles.iter().map(|r| r.id.clone()).collect(),
            draft_picks: self.stats.draft_picks(),
            hide_ratings: self.stats.hide_ratings,
            restriction_durations: self.stats.restriction_durations.clone(),
            list_debounce: self.cache.debounce_timing()?,
        })
    }
}
