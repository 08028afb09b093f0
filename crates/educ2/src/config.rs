//! Server configuration.
//!
//! Settings come from three places, highest precedence first: command
//! line flags, an optional TOML file named by `--config`, and built-in
//! defaults.
//!
//! ```toml
//! [server]
//! listen = "127.0.0.1:2323"
//!
//! [simulation]
//! tick_interval_ms = 500
//!
//! [logging]
//! level = "debug"
//!
//! [[users]]
//! id = 1
//! username = "admin"
//! password = "admin"
//! role = "admin"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use educ2_session::{StaticCredentialStore, UserRecord, default_users};
use educ2_sim::{DEFAULT_TICK_INTERVAL, SimConfig};
use serde::Deserialize;

/// Port the original service listens on. Binding it may need privileges.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:999";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "educ2")]
#[command(version)]
#[command(about = "Educational C2 simulator (no real traffic is ever sent)", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1:2323)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Milliseconds between simulated progress lines
    #[arg(short = 't', long)]
    pub tick_interval_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub logging: LoggingSection,
    /// `None` when the file has no `[[users]]` at all.
    pub users: Option<Vec<UserRecord>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServerSection {
    pub listen: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SimulationSection {
    pub tick_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoggingSection {
    pub level: Option<String>,
}

impl TomlConfig {
    /// Reads and parses a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }
}

/// Final resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub tick_interval: Duration,
    pub log_level: String,
    pub users: Vec<UserRecord>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            users: default_users(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and the optional
    /// TOML file they name.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    /// Like [`load`](Self::load), for already-parsed arguments.
    pub fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merges CLI arguments over file values over defaults, then
    /// validates the result.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] for a zero tick interval, an empty user
    /// list, or two users with the same username.
    pub fn resolve(cli: CliArgs, file: TomlConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let tick_interval = match cli.tick_interval_ms.or(file.simulation.tick_interval_ms) {
            Some(0) => {
                return Err(ConfigError::Invalid(
                    "tick interval must be at least 1 ms".into(),
                ));
            }
            Some(ms) => Duration::from_millis(ms),
            None => defaults.tick_interval,
        };

        let config = Config {
            listen: cli
                .listen
                .or(file.server.listen)
                .unwrap_or(defaults.listen),
            tick_interval,
            log_level: cli
                .log_level
                .or(file.logging.level)
                .unwrap_or(defaults.log_level),
            users: file.users.unwrap_or(defaults.users),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.users.is_empty() {
            return Err(ConfigError::Invalid("no users configured".into()));
        }
        let mut seen = HashSet::new();
        for user in &self.users {
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate username {:?}",
                    user.username
                )));
            }
        }
        Ok(())
    }

    /// Simulation settings derived from this config.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            tick_interval: self.tick_interval,
        }
    }

    /// A credential store over the configured users.
    pub fn credential_store(&self) -> StaticCredentialStore {
        StaticCredentialStore::new(self.users.clone())
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {err}", path = .0.display(), err = .1)]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file '{path}': {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
