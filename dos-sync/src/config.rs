//! Runtime configuration for a reconciliation run.

use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheConfig;

/// Largest change request the downstream queue accepts (256 KiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 256 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Settings for the reconciler.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Encoded requests larger than this go to the dead-letter queue.
    pub max_payload_bytes: usize,

    /// Location cache sizing.
    pub cache: CacheConfig,

    /// Feature flag rules file. Built-in defaults when absent.
    pub flags_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            cache: CacheConfig::default(),
            flags_path: None,
        }
    }
}

impl SyncConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Build configuration from an environment-variable lookup.
    ///
    /// Every variable is optional:
    ///
    /// | variable | default |
    /// |---|---|
    /// | `DOS_SYNC_MAX_PAYLOAD_BYTES` | 262144 |
    /// | `DOS_SYNC_LOCATION_CACHE_TTL_SECS` | 900 |
    /// | `DOS_SYNC_LOCATION_CACHE_CAPACITY` | 10000 |
    /// | `DOS_SYNC_FLAGS_PATH` | none |
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let defaults = Self::default();

        let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
            match lookup(var) {
                Ok(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                }),
                Err(VarError::NotPresent) => Ok(default),
                Err(e) => Err(ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                }),
            }
        };

        let max_payload_bytes = parse_u64(
            "DOS_SYNC_MAX_PAYLOAD_BYTES",
            defaults.max_payload_bytes as u64,
        )?;
        let max_payload_bytes =
            usize::try_from(max_payload_bytes).map_err(|e| ConfigError::InvalidEnvVar {
                var: "DOS_SYNC_MAX_PAYLOAD_BYTES".to_string(),
                reason: e.to_string(),
            })?;

        let ttl_secs = parse_u64(
            "DOS_SYNC_LOCATION_CACHE_TTL_SECS",
            defaults.cache.ttl.as_secs(),
        )?;
        let max_capacity = parse_u64(
            "DOS_SYNC_LOCATION_CACHE_CAPACITY",
            defaults.cache.max_capacity,
        )?;

        let flags_path = lookup("DOS_SYNC_FLAGS_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            max_payload_bytes,
            cache: CacheConfig {
                ttl: Duration::from_secs(ttl_secs),
                max_capacity,
            },
            flags_path,
        })
    }
}
