//! Session policy configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Limits and defaults applied when sessions are created and deleted
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// TTL used when a request names neither `ttlSeconds` nor `expiresAt`
    #[serde(default = "default_ttl")]
    pub default_ttl_secs: u64,

    /// Upper bound on any requested lifetime
    #[serde(default = "default_max_ttl")]
    pub max_ttl_secs: u64,

    /// Maximum payload size in bytes
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// Attempts at generating an unused session id
    #[serde(default = "default_key_generation_attempts")]
    pub key_generation_attempts: u32,

    /// Per-item deletes in flight during a bulk delete
    #[serde(default = "default_delete_concurrency")]
    pub delete_concurrency: usize,
}

impl SessionsConfig {
    /// Validate session policy
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_ttl_secs == 0 {
            return Err(ValidationError::MustBePositive("max_ttl_secs"));
        }
        if self.default_ttl_secs == 0 || self.default_ttl_secs > self.max_ttl_secs {
            return Err(ValidationError::InvalidDefaultTtl);
        }
        if self.max_payload_bytes == 0 {
            return Err(ValidationError::MustBePositive("max_payload_bytes"));
        }
        if self.key_generation_attempts == 0 {
            return Err(ValidationError::MustBePositive("key_generation_attempts"));
        }
        if self.delete_concurrency == 0 {
            return Err(ValidationError::MustBePositive("delete_concurrency"));
        }
        Ok(())
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl(),
            max_ttl_secs: default_max_ttl(),
            max_payload_bytes: default_max_payload_bytes(),
            key_generation_attempts: default_key_generation_attempts(),
            delete_concurrency: default_delete_concurrency(),
        }
    }
}

fn default_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_max_ttl() -> u64 {
    30 * 24 * 60 * 60
}

fn default_max_payload_bytes() -> usize {
    64 * 1024
}

fn default_key_generation_attempts() -> u32 {
    3
}

fn default_delete_concurrency() -> usize {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionsConfig::default();
        assert_eq!(config.default_ttl_secs, 604_800);
        assert_eq!(config.max_ttl_secs, 2_592_000);
        assert_eq!(config.max_payload_bytes, 65_536);
        assert_eq!(config.key_generation_attempts, 3);
        assert_eq!(config.delete_concurrency, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_ttl_above_max_is_rejected() {
        let config = SessionsConfig {
            default_ttl_secs: 100,
            max_ttl_secs: 10,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidDefaultTtl)
        ));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        for config in [
            SessionsConfig {
                key_generation_attempts: 0,
                ..Default::default()
            },
            SessionsConfig {
                delete_concurrency: 0,
                ..Default::default()
            },
            SessionsConfig {
                max_payload_bytes: 0,
                ..Default::default()
            },
        ] {
            assert!(config.validate().is_err());
        }
    }
}
