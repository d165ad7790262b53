//! Configuration module for circle-sketch.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "circle-sketch")]
#[command(author = "circle-sketch authors")]
#[command(version = "0.1.0")]
#[command(about = "Stream unit-circle points over UDP and sketch them", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Mode,
}

/// Which side of the protocol to run
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Accept control connections and stream points on request
    Server,
    /// Receive point data and draw lines between consecutive points
    Client {
        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Endpoints shared by both sides
#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    /// Control plane (TCP) endpoint
    #[serde(default = "default_control")]
    pub control: String,
    /// Data plane (UDP) endpoint
    #[serde(default = "default_data")]
    pub data: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            control: default_control(),
            data: default_data(),
        }
    }
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Emitter tick interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Maximum number of concurrent control sessions
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            max_connections: default_max_connections(),
        }
    }
}

/// Client-related configuration
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// How long to sketch before stopping, in seconds
    #[serde(default = "default_session_secs")]
    pub session_secs: u64,
    /// Read deadline for each datagram, in seconds
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Capacity of the receiver to sketcher point channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Side of the square drawing area in pixels
    #[serde(default = "default_scale")]
    pub scale: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session_secs: default_session_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            channel_capacity: default_channel_capacity(),
            scale: default_scale(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_control() -> String {
    "localhost:5000".to_string()
}

fn default_data() -> String {
    "localhost:5001".to_string()
}

fn default_tick_ms() -> u64 {
    7
}

fn default_max_connections() -> usize {
    1024
}

fn default_session_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    1
}

fn default_scale() -> u32 {
    crate::canvas::SCALE
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub control_addr: String,
    pub data_addr: String,
    pub tick: Duration,
    pub max_connections: usize,
    pub session: Duration,
    pub read_timeout: Duration,
    pub channel_capacity: usize,
    pub scale: u32,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they point at, if any.
    /// CLI arguments take precedence over TOML file values.
    pub fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let config = Config {
            mode: cli.command,
            control_addr: toml_config.network.control,
            data_addr: toml_config.network.data,
            tick: Duration::from_millis(toml_config.server.tick_ms),
            max_connections: toml_config.server.max_connections,
            session: Duration::from_secs(toml_config.client.session_secs),
            read_timeout: Duration::from_secs(toml_config.client.read_timeout_secs),
            channel_capacity: toml_config.client.channel_capacity,
            scale: toml_config.client.scale,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick.is_zero() {
            return Err(ConfigError::Invalid("server.tick_ms must be non-zero"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("server.max_connections must be non-zero"));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid("client.channel_capacity must be non-zero"));
        }
        if self.scale == 0 {
            return Err(ConfigError::Invalid("client.scale must be non-zero"));
        }
        Ok(())
    }

    /// Defaults for the given mode, as if no config file were given.
    #[cfg(test)]
    pub fn with_mode(mode: Mode) -> Self {
        let cli = CliArgs {
            config: None,
            log_level: default_log_level(),
            command: mode,
        };
        Self::from_cli(cli).expect("defaults are valid")
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
