//! Configuration management
//!
//! This module handles loading and parsing configuration for the magazine data layer.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Media storage configuration
    #[serde(default)]
    pub media: MediaConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Upper bound on pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/magazine.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Media storage configuration
///
/// Uploaded assets are written below `root` at the path produced by the
/// upload path deriver; `url` is the public prefix those paths are served from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory holding uploaded files
    #[serde(default = "default_media_root")]
    pub root: PathBuf,
    /// Public URL prefix for stored files
    #[serde(default = "default_media_url")]
    pub url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            url: default_media_url(),
        }
    }
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_media_url() -> String {
    "/media/".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - MAGAZINE_DATABASE_DRIVER
    /// - MAGAZINE_DATABASE_URL
    /// - MAGAZINE_DATABASE_MAX_CONNECTIONS
    /// - MAGAZINE_MEDIA_ROOT
    /// - MAGAZINE_MEDIA_URL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(driver) = std::env::var("MAGAZINE_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("MAGAZINE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(max) = std::env::var("MAGAZINE_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = max;
            }
        }

        if let Ok(root) = std::env::var("MAGAZINE_MEDIA_ROOT") {
            self.media.root = PathBuf::from(root);
        }
        if let Ok(url) = std::env::var("MAGAZINE_MEDIA_URL") {
            self.media.url = url;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "MAGAZINE_DATABASE_DRIVER",
    "MAGAZINE_DATABASE_URL",
    "MAGAZINE_DATABASE_MAX_CONNECTIONS",
    "MAGAZINE_MEDIA_ROOT",
    "MAGAZINE_MEDIA_URL",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn driver_strategy() -> impl Strategy<Value = DatabaseDriver> {
        prop_oneof![Just(DatabaseDriver::Sqlite), Just(DatabaseDriver::Mysql)]
    }

    fn config_strategy() -> impl Strategy<Value = Config> {
        (
            driver_strategy(),
            "[a-z]{1,12}/[a-z]{1,12}\\.db",
            1u32..100,
            "[a-z]{1,10}(/[a-z]{1,10}){0,2}",
            "/[a-z]{1,10}/",
        )
            .prop_map(|(driver, url, max_connections, root, media_url)| Config {
                database: DatabaseConfig { driver, url, max_connections },
                media: MediaConfig { root: PathBuf::from(root), url: media_url },
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Writing a config out as YAML and loading it back yields the same values.
        #[test]
        fn config_yaml_roundtrip(config in config_strategy()) {
            let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let parsed = Config::load(file.path()).expect("Failed to parse config");

            prop_assert_eq!(config.database.driver, parsed.database.driver);
            prop_assert_eq!(config.database.url, parsed.database.url);
            prop_assert_eq!(config.database.max_connections, parsed.database.max_connections);
            prop_assert_eq!(config.media.root, parsed.media.root);
            prop_assert_eq!(config.media.url, parsed.media.url);
        }

        /// Environment variables win over values read from the file.
        #[test]
        fn env_takes_precedence_over_file(
            file_max in 1u32..50,
            env_max in 50u32..100,
        ) {
            let _guard = lock_env();
            clear_env();

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "database:\n  max_connections: {}\n", file_max)
                .expect("Failed to write config");

            std::env::set_var("MAGAZINE_DATABASE_MAX_CONNECTIONS", env_max.to_string());
            let config = Config::load_with_env(file.path()).expect("Failed to load config");
            clear_env();

            prop_assert_eq!(config.database.max_connections, env_max);
        }
    }
}
