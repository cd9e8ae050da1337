//! Configuration management for the server.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Base URL of the remote document store, without a trailing slash
    pub remote_store_url: String,
    /// Directory holding the persisted key-value store
    pub data_dir: PathBuf,
    /// Hostname the app is served under; selects the remote branch
    pub public_hostname: String,
    /// Quiet period before local changes are pushed
    pub sync_debounce: Duration,
    /// Local hour of the daily backup
    pub backup_hour: u32,
    /// How often the backup scheduler re-evaluates
    pub backup_check_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let remote_store_url = lookup("REMOTE_STORE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingRemoteStoreUrl)?;

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let public_hostname = lookup("PUBLIC_HOSTNAME").unwrap_or_else(|| "localhost".to_string());

        let sync_debounce = Duration::from_millis(number(&lookup, "SYNC_DEBOUNCE_MS", 2000)?);

        let backup_hour = number(&lookup, "BACKUP_HOUR", 1)?;
        if backup_hour > 23 {
            return Err(ConfigError::InvalidBackupHour(backup_hour));
        }

        let backup_check_interval =
            Duration::from_secs(number(&lookup, "BACKUP_CHECK_INTERVAL_SECS", 3600)?.max(1));

        Ok(Self {
            host,
            port,
            remote_store_url,
            data_dir,
            public_hostname,
            sync_debounce,
            backup_hour: backup_hour as u32,
            backup_check_interval,
        })
    }
}

fn number<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("REMOTE_STORE_URL environment variable is required")]
    MissingRemoteStoreUrl,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid value for {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("BACKUP_HOUR must be between 0 and 23, got {0}")]
    InvalidBackupHour(u64),
}
