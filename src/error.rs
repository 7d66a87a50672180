//! Error types for the bot core.
//!
//! Transport and bootstrap code uses `anyhow`; the pipeline and config store
//! return these so callers can tell the cases apart.

use std::path::PathBuf;

/// Failure to load the configuration file at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No channels specified in config")]
    MissingChannels,

    #[error("Invalid response_delay {0}: must be a non-negative number of seconds")]
    InvalidResponseDelay(f64),
}

/// Failure to write the configuration back to disk.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to write config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a config store operation that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Author is not a moderator or the broadcaster")]
    Unauthorized,

    #[error("'{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// A timeout or delete call against the platform failed.
#[derive(Debug, thiserror::Error)]
#[error("Failed to {action} for {username} in #{channel}: {error:#}")]
pub struct ModerationActionError {
    pub action: &'static str,
    pub username: String,
    pub channel: String,
    pub error: anyhow::Error,
}
