//! Configuration for the benchmark.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values. Defaults reproduce
//! the classic fixed constants: port 12348, nine trial sizes, 4 MiB socket
//! buffers, and a one second settle delay before each connection attempt.

use crate::sock::DEFAULT_SOCKET_BUFFER;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the benchmark
#[derive(Parser, Debug)]
#[command(name = "loopbench")]
#[command(version = "0.1.0")]
#[command(about = "Loopback TCP throughput benchmark", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// TCP port the receiver listens on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Number of trials; trial i transfers 10^i bytes (at most 19)
    #[arg(short, long)]
    pub trials: Option<u32>,

    /// Grace period between spawning the receiver and connecting, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Send/receive socket buffer size in bytes; also caps the transfer chunk size
    #[arg(long)]
    pub socket_buffer: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network-related configuration
#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    /// TCP port the receiver listens on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Send/receive buffer size applied to every socket, in bytes; also caps
    /// the chunk size of the transfer loops
    #[serde(default = "default_socket_buffer")]
    pub socket_buffer: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            socket_buffer: default_socket_buffer(),
        }
    }
}

/// Trial-series configuration
#[derive(Debug, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of trials; trial i transfers 10^i bytes
    #[serde(default = "default_trials")]
    pub trials: u32,
    /// Grace period between spawning the receiver and connecting
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            settle_ms: default_settle_ms(),
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

fn default_port() -> u16 {
    12348
}

fn default_socket_buffer() -> usize {
    DEFAULT_SOCKET_BUFFER
}

fn default_trials() -> u32 {
    9
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Largest accepted trial count; 10^19 no longer fits in a u64.
const MAX_TRIALS: u32 = 19;

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub socket_buffer: usize,
    pub trials: u32,
    pub settle: Duration,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(CliArgs::parse())
    }

    fn resolve(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let socket_buffer = cli
            .socket_buffer
            .unwrap_or(toml_config.network.socket_buffer);
        if socket_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "socket_buffer must be at least 1 byte",
            ));
        }

        let trials = cli.trials.unwrap_or(toml_config.benchmark.trials);
        if trials > MAX_TRIALS {
            return Err(ConfigError::InvalidValue(
                "trials must be at most 19 so every 10^i payload size fits in a u64",
            ));
        }

        Ok(Config {
            port: cli.port.unwrap_or(toml_config.network.port),
            socket_buffer,
            trials,
            settle: Duration::from_millis(
                cli.settle_ms.unwrap_or(toml_config.benchmark.settle_ms),
            ),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        })
    }

    /// Payload sizes for the configured run: 10^i bytes for trial i.
    /// Strictly increasing, starting at one byte.
    pub fn trial_sizes(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.trials).map(|i| 10u64.pow(i))
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    InvalidValue(&'static str),
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
            ConfigError::InvalidValue(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
