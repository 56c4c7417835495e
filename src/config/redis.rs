//! Redis configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL (may embed credentials)
    #[serde(default = "empty_secret")]
    pub url: SecretString,

    /// Prefix for every key written by the session table
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.url.expose_secret();
        if url.is_empty() {
            return Err(ValidationError::MissingRequired("SESSION_STORE__STORAGE__REDIS__URL"));
        }
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.key_prefix.trim().is_empty() {
            return Err(ValidationError::EmptyKeyPrefix);
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: empty_secret(),
            key_prefix: default_key_prefix(),
            timeout_secs: default_timeout(),
        }
    }
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_key_prefix() -> String {
    "sessions".to_string()
}

fn default_timeout() -> u64 {
    5
}
