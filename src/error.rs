//! Error handling for lrcresolve
//!
//! Typed errors for the parts of the application that can actually fail from the
//! caller's point of view: configuration, invalid queries and cache administration.
//! Provider failures inside the resolution pipeline are not errors; each stage reports
//! them as [`StageOutcome::Unavailable`](crate::core::services::StageOutcome) and the
//! pipeline moves on to its next fallback.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Lyrics error: {0}")]
    Lyrics(#[from] LyricsError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("API response invalid: {reason}")]
    InvalidResponse { reason: String },
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis operation failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization failed: {0}")]
    Serialization(serde_json::Error),

    #[error("Cache store did not answer in time")]
    Timeout,

    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    #[error("No cache store configured")]
    NotConfigured,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Failed to determine project directories")]
    NoProjectDirs,
}

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("Missing title")]
    MissingTitle,

    #[error("Lyrics not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, ResolverError>;

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err)
    }
}

impl From<std::io::Error> for ResolverError {
    fn from(err: std::io::Error) -> Self {
        ResolverError::Internal(err.into())
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(err: serde_json::Error) -> Self {
        ResolverError::Cache(CacheError::Serialization(err))
    }
}

impl From<toml::de::Error> for ResolverError {
    fn from(err: toml::de::Error) -> Self {
        ResolverError::Config(ConfigError::InvalidFormat(err))
    }
}

impl From<toml::ser::Error> for ResolverError {
    fn from(err: toml::ser::Error) -> Self {
        ResolverError::Config(ConfigError::Serialize(err))
    }
}

impl From<tokio::task::JoinError> for ResolverError {
    fn from(err: tokio::task::JoinError) -> Self {
        ResolverError::Internal(err.into())
    }
}
