//! Server configuration from environment variables.
//!
//! # Invariants
//! - `SAMACARNET_DB_PATH` is required; everything else has a default.
//! - Invalid values fail startup instead of falling back silently.

use samacarnet_core::default_log_level;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "SAMACARNET_DB_PATH";
pub const BIND_VAR: &str = "SAMACARNET_BIND";
pub const LOG_LEVEL_VAR: &str = "SAMACARNET_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "SAMACARNET_LOG_DIR";
pub const TOKEN_TTL_VAR: &str = "SAMACARNET_TOKEN_TTL_SECS";

pub const DEFAULT_BIND: &str = "127.0.0.1:3333";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: `{value}`")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub token_ttl_secs: u64,
}

impl ServerConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal in production.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_path = read(DB_PATH_VAR)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(DB_PATH_VAR))?;

        let bind_text = read(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_text
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| invalid(BIND_VAR, &bind_text))?;

        let log_level = match read(LOG_LEVEL_VAR) {
            Some(level) => {
                let normalized = level.trim().to_ascii_lowercase();
                if !LOG_LEVELS.contains(&normalized.as_str()) {
                    return Err(invalid(LOG_LEVEL_VAR, &level));
                }
                normalized
            }
            None => default_log_level().to_string(),
        };

        let log_dir = match read(LOG_DIR_VAR) {
            Some(dir) => {
                let path = PathBuf::from(dir.trim());
                if !path.is_absolute() {
                    return Err(invalid(LOG_DIR_VAR, &dir));
                }
                Some(path)
            }
            None => None,
        };

        let token_ttl_secs = match read(TOKEN_TTL_VAR) {
            Some(text) => text
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| invalid(TOKEN_TTL_VAR, &text))?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        Ok(Self {
            db_path,
            bind,
            log_level,
            log_dir,
            token_ttl_secs,
        })
    }

    pub fn token_ttl_ms(&self) -> i64 {
        i64::try_from(self.token_ttl_secs.saturating_mul(1_000)).unwrap_or(i64::MAX)
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
