//! Storage backend configuration

use serde::Deserialize;
use std::time::Duration;

use super::database::DatabaseConfig;
use super::error::ValidationError;
use super::redis::RedisConfig;

/// Which session table implementation to run against
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; state is lost on restart
    #[default]
    Memory,
    Redis,
    Postgres,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Selected backend
    #[serde(default)]
    pub backend: StorageBackend,

    /// Deadline for a single storage call in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Redis settings, required when `backend = redis`
    #[serde(default)]
    pub redis: RedisConfig,

    /// PostgreSQL settings, required when `backend = postgres`
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl StorageConfig {
    /// Get the per-call deadline as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the selected backend's settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_ms == 0 || self.timeout_ms > 60_000 {
            return Err(ValidationError::InvalidStorageTimeout);
        }
        match self.backend {
            StorageBackend::Memory => Ok(()),
            StorageBackend::Redis => self.redis.validate(),
            StorageBackend::Postgres => self.database.validate(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            timeout_ms: default_timeout_ms(),
            redis: RedisConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    2_000
}
