use std::{collections::HashMap, str::FromStr, time::Duration};

use thiserror::Error;

const PREFIX: &str = "RELAY_";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for config key '{key}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

#[non_exhaustive]
pub struct Config {
    kv: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let kv = std::env::vars()
            .filter(|(k, _)| k.starts_with(PREFIX))
            .collect();

        Self { kv }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_map(kv: HashMap<String, String>) -> Self {
        Self { kv }
    }

    pub fn optional(&self, key: &str) -> Option<&str> {
        self.kv.get(key).map(|v| v.as_str())
    }

    /// Parses `key` when present, falls back to `default` when absent.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Like [`Config::parse_or`], but a parsed value of zero is rejected.
    pub fn parse_nonzero_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Default + PartialEq,
        T::Err: std::fmt::Display,
    {
        let value = self.parse_or(key, default)?;
        if value == T::default() {
            return Err(ConfigError::Invalid {
                key: key.to_string(),
                value: self.optional(key).unwrap_or_default().to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    }
}

/// Typed worker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub concurrency: usize,
    pub handler_timeout: Duration,
    pub rate_limit_burst: u32,
    pub rate_limit_per_sec: u32,
    pub retry_attempts: u32,
    pub retry_base_delay: Duration,
    pub auth_token: Option<String>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            concurrency: config.parse_or("RELAY_CONCURRENCY", 30usize)?.max(1),
            handler_timeout: Duration::from_millis(
                config.parse_or("RELAY_HANDLER_TIMEOUT_MS", 5_000u64)?,
            ),
            rate_limit_burst: config.parse_nonzero_or("RELAY_RATE_LIMIT_BURST", 50u32)?,
            rate_limit_per_sec: config.parse_nonzero_or("RELAY_RATE_LIMIT_PER_SEC", 20u32)?,
            retry_attempts: config.parse_or("RELAY_RETRY_ATTEMPTS", 3u32)?,
            retry_base_delay: Duration::from_millis(
                config.parse_or("RELAY_RETRY_BASE_MS", 100u64)?,
            ),
            auth_token: config
                .optional("RELAY_AUTH_TOKEN")
                .filter(|token| !token.is_empty())
                .map(String::from),
        })
    }
}
