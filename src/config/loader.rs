//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::AgentConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV_VAR: &str = "PONG_BOT_CONFIG";

/// Config file used when `PONG_BOT_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "pong-bot.toml";

/// Environment variable overriding `telegram.bot_token`.
pub const TELEGRAM_TOKEN_ENV_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable overriding `telegram.chat_id`.
pub const TELEGRAM_CHAT_ENV_VAR: &str = "TELEGRAM_CHAT_ID";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AgentConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: AgentConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the config path from the environment.
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the agent configuration the way the binary does.
///
/// A missing file means built-in defaults. Telegram credentials from the
/// environment take precedence over the file, and the merged result is
/// validated again.
pub fn load_from_env() -> Result<AgentConfig, ConfigError> {
    let path = config_path();
    let mut config = if path.exists() {
        load_config(&path)?
    } else {
        tracing::info!(path = %path.display(), "Config file not found, using defaults");
        AgentConfig::default()
    };

    if let Ok(token) = std::env::var(TELEGRAM_TOKEN_ENV_VAR) {
        config.telegram.bot_token = token;
    }
    if let Ok(chat_id) = std::env::var(TELEGRAM_CHAT_ENV_VAR) {
        config.telegram.chat_id = chat_id;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
