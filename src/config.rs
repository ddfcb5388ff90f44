use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ordering::PositionPolicy;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// How many times a conflicting write is attempted
    pub retry_attempts: ConfigValue<u32>,
    /// What to do with out-of-range move targets
    pub position_policy: ConfigValue<PositionPolicy>,
    /// HTTP port for foodlog-server
    pub port: ConfigValue<u16>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    retry_attempts: Option<u32>,
    position_policy: Option<PositionPolicy>,
    port: Option<u16>,
}

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_PORT: u16 = 8080;

fn env_override<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidEnv(name.to_string(), e.to_string())),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("foodlog.db"),
            ConfigSource::Default,
        );
        let mut retry_attempts = ConfigValue::new(DEFAULT_RETRY_ATTEMPTS, ConfigSource::Default);
        let mut position_policy = ConfigValue::new(PositionPolicy::default(), ConfigSource::Default);
        let mut port = ConfigValue::new(DEFAULT_PORT, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(attempts) = file_config.retry_attempts {
                retry_attempts = ConfigValue::new(attempts, ConfigSource::File);
            }
            if let Some(policy) = file_config.position_policy {
                position_policy = ConfigValue::new(policy, ConfigSource::File);
            }
            if let Some(p) = file_config.port {
                port = ConfigValue::new(p, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(db_path) = std::env::var("FOODLOG_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Some(attempts) = env_override("FOODLOG_RETRY_ATTEMPTS")? {
            retry_attempts = ConfigValue::new(attempts, ConfigSource::Environment);
        }
        if let Some(policy) = env_override("FOODLOG_POSITION_POLICY")? {
            position_policy = ConfigValue::new(policy, ConfigSource::Environment);
        }
        if let Some(p) = env_override("FOODLOG_PORT")? {
            port = ConfigValue::new(p, ConfigSource::Environment);
        }

        if retry_attempts.value == 0 {
            return Err(ConfigError::Invalid(
                "retry_attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database_path,
            retry_attempts,
            position_policy,
            port,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/foodlog/
    /// - macOS: ~/Library/Application Support/foodlog/
    /// - Windows: %APPDATA%/foodlog/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("foodlog")
    }

    /// Default data directory (platform-specific), e.g. ~/.local/share/foodlog/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("foodlog")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidEnv(String, String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidEnv(name, e) => {
                write!(f, "Invalid value for {}: {}", name, e)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
