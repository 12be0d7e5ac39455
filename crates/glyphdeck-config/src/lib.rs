//! Configuration for the glyphdeck dashboard.
//!
//! Settings live in a TOML file in the platform config directory
//! (`~/.config/glyphdeck/config.toml` on Linux). Every field has a default,
//! so a missing file or a partial one is fine.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use glyphdeck_core::{DirectionPolicy, Theme};
use serde::{Deserialize, Serialize};

/// Default stats endpoint base URL.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

/// Default stats poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where and how often to poll for counter values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Base URL; `/api/v1/stats` is appended.
    pub endpoint: String,
    pub poll_interval_ms: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl StatsConfig {
    /// Full URL of the stats resource.
    pub fn stats_url(&self) -> String {
        format!("{}/api/v1/stats", self.endpoint.trim_end_matches('/'))
    }
}

/// A counter shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Stats key the counter follows.
    pub id: String,
    /// Caption drawn under the digits.
    pub label: String,
}

impl CounterConfig {
    fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainConfig {
    pub directions: DirectionPolicy,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub stats: StatsConfig,
    pub rain: RainConfig,
    #[serde(rename = "counter")]
    pub counters: Vec<CounterConfig>,
    /// Lines revealed with the scramble effect.
    pub headlines: Vec<String>,
    /// Fixed RNG seed, for reproducible animation.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            stats: StatsConfig::default(),
            rain: RainConfig::default(),
            counters: vec![
                CounterConfig::new("registered_users", "registered users"),
                CounterConfig::new("programs", "programs"),
                CounterConfig::new("proofs_generated", "proofs generated"),
                CounterConfig::new("proofs_verified", "proofs verified"),
            ],
            headlines: vec![
                "network activity".to_string(),
                "live from the devnet".to_string(),
            ],
            seed: None,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "glyphdeck").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`, or from [`Config::default_path`] when `None`.
    ///
    /// A file that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            theme = "phosphor"

            [stats]
            endpoint = "https://explorer.example.net/"

            [rain]
            directions = "mixed"

            [[counter]]
            id = "proofs_verified"
            label = "verified"
            "#,
        )
        .unwrap();

        assert_eq!(config.theme, Theme::Phosphor);
        assert_eq!(config.stats.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(
            config.stats.stats_url(),
            "https://explorer.example.net/api/v1/stats"
        );
        assert_eq!(config.rain.directions, DirectionPolicy::Mixed);
        assert_eq!(config.counters.len(), 1);
        assert_eq!(config.counters[0].id, "proofs_verified");
        assert_eq!(config.headlines, Config::default().headlines);
    }

    #[test]
    fn test_unknown_theme_is_rejected() {
        assert!(Config::from_toml("theme = \"neon\"").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("glyphdeck-config-test-does-not-exist.toml");
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "glyphdeck-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "seed = \"not a number\"").unwrap();
        let result = Config::load(Some(&path));
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
