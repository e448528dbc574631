use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use directories::ProjectDirs;

use crate::error::{ConfigError, Result, ResolverError};

pub mod env;
pub mod validation;

use env::{EnvParser, EnvVars};
use validation::ConfigValidator;

pub const DEFAULT_SONG_SEARCH_URL: &str = "https://mobileservice.kugou.com/api/v3/search/song";
pub const DEFAULT_LYRICS_SEARCH_URL: &str = "https://lyrics.kugou.com/search";
pub const DEFAULT_LYRICS_DOWNLOAD_URL: &str = "https://lyrics.kugou.com/download";

/// Which store backs the memoization layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis when `redis_url` is set, otherwise no caching
    Auto,
    /// In-process store, lost on exit
    Memory,
    Disabled,
}

impl std::str::FromStr for CacheBackend {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" | "redis" => Ok(CacheBackend::Auto),
            "memory" => Ok(CacheBackend::Memory),
            "disabled" | "none" | "off" => Ok(CacheBackend::Disabled),
            other => Err(ConfigError::InvalidValue {
                field: "cache_backend".to_string(),
                value: other.to_string(),
            }
            .into()),
        }
    }
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Auto
}

fn default_song_search_url() -> String {
    DEFAULT_SONG_SEARCH_URL.to_string()
}

fn default_lyrics_search_url() -> String {
    DEFAULT_LYRICS_SEARCH_URL.to_string()
}

fn default_lyrics_download_url() -> String {
    DEFAULT_LYRICS_DOWNLOAD_URL.to_string()
}

fn default_request_timeout_seconds() -> u64 {
    8
}

fn default_cache_connect_timeout_seconds() -> u64 {
    10
}

fn default_search_ttl_seconds() -> u64 {
    3600
}

fn default_download_ttl_seconds() -> u64 {
    86400
}

fn default_ttl_seconds() -> u64 {
    3600
}

fn default_cache_key_prefix() -> String {
    "lyrics_cache".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Redis URL for the memoization store (optional)
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Memoization store selection
    #[serde(default = "default_cache_backend")]
    pub cache_backend: CacheBackend,

    /// Provider song search endpoint
    #[serde(default = "default_song_search_url")]
    pub song_search_url: String,

    /// Provider lyrics search endpoint
    #[serde(default = "default_lyrics_search_url")]
    pub lyrics_search_url: String,

    /// Provider lyrics download endpoint
    #[serde(default = "default_lyrics_download_url")]
    pub lyrics_download_url: String,

    /// Timeout for each outbound provider call (seconds)
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Upper bound for any single cache store round-trip (seconds)
    #[serde(default = "default_cache_connect_timeout_seconds")]
    pub cache_connect_timeout_seconds: u64,

    /// TTL for song and lyrics search results (seconds)
    #[serde(default = "default_search_ttl_seconds")]
    pub search_ttl_seconds: u64,

    /// TTL for downloaded lyric bodies (seconds)
    #[serde(default = "default_download_ttl_seconds")]
    pub download_ttl_seconds: u64,

    /// TTL applied when a memoized call does not specify one (seconds)
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,

    /// Namespace for every memoization key
    #[serde(default = "default_cache_key_prefix")]
    pub cache_key_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            cache_backend: default_cache_backend(),
            song_search_url: default_song_search_url(),
            lyrics_search_url: default_lyrics_search_url(),
            lyrics_download_url: default_lyrics_download_url(),
            request_timeout_seconds: default_request_timeout_seconds(),
            cache_connect_timeout_seconds: default_cache_connect_timeout_seconds(),
            search_ttl_seconds: default_search_ttl_seconds(),
            download_ttl_seconds: default_download_ttl_seconds(),
            default_ttl_seconds: default_ttl_seconds(),
            cache_key_prefix: default_cache_key_prefix(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Try to load .env file if it exists (for Docker and development)
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        let config_file = if let Some(path) = config_path {
            PathBuf::from(path)
        } else {
            Self::default_config_path()?
        };

        if config_file.exists() {
            let content = fs::read_to_string(&config_file)?;
            config = toml::from_str(&content)?;
        }

        // Environment variables have the highest priority
        config.load_from_env()?;
        config.validate()?;

        // Save config file if it doesn't exist
        if !config_file.exists() {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent)?;
            }
            config.save(&config_file)?;
        }

        Ok(config)
    }

    fn load_from_env(&mut self) -> Result<()> {
        if let Some(redis_url) = EnvParser::first_of(&[EnvVars::REDIS_URL, EnvVars::PLATFORM_REDIS_URL])? {
            self.redis_url = Some(redis_url);
        }

        if let Some(backend) = EnvParser::parse_string(EnvVars::CACHE_BACKEND, None)? {
            self.cache_backend = backend.parse()?;
        }

        if let Some(url) = EnvParser::parse_string(EnvVars::SONG_SEARCH_URL, None)? {
            self.song_search_url = url;
        }

        if let Some(url) = EnvParser::parse_string(EnvVars::LYRICS_SEARCH_URL, None)? {
            self.lyrics_search_url = url;
        }

        if let Some(url) = EnvParser::parse_string(EnvVars::LYRICS_DOWNLOAD_URL, None)? {
            self.lyrics_download_url = url;
        }

        if let Some(value) = EnvParser::parse_u64(EnvVars::REQUEST_TIMEOUT_SECONDS, 1, 120)? {
            self.request_timeout_seconds = value;
        }

        if let Some(value) = EnvParser::parse_u64(EnvVars::CACHE_CONNECT_TIMEOUT_SECONDS, 1, 120)? {
            self.cache_connect_timeout_seconds = value;
        }

        if let Some(value) = EnvParser::parse_u64(EnvVars::SEARCH_TTL_SECONDS, 1, 30 * 86400)? {
            self.search_ttl_seconds = value;
        }

        if let Some(value) = EnvParser::parse_u64(EnvVars::DOWNLOAD_TTL_SECONDS, 1, 30 * 86400)? {
            self.download_ttl_seconds = value;
        }

        if let Some(value) = EnvParser::parse_u64(EnvVars::DEFAULT_TTL_SECONDS, 1, 30 * 86400)? {
            self.default_ttl_seconds = value;
        }

        if let Some(prefix) = EnvParser::parse_string(EnvVars::CACHE_KEY_PREFIX, None)? {
            self.cache_key_prefix = prefix;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_url(&self.song_search_url, "song search")?;
        ConfigValidator::validate_url(&self.lyrics_search_url, "lyrics search")?;
        ConfigValidator::validate_url(&self.lyrics_download_url, "lyrics download")?;
        ConfigValidator::validate_range(self.request_timeout_seconds, 1, 120, "request_timeout_seconds")?;
        ConfigValidator::validate_range(self.cache_connect_timeout_seconds, 1, 120, "cache_connect_timeout_seconds")?;
        ConfigValidator::validate_range(self.search_ttl_seconds, 1, 30 * 86400, "search_ttl_seconds")?;
        ConfigValidator::validate_range(self.download_ttl_seconds, 1, 30 * 86400, "download_ttl_seconds")?;
        ConfigValidator::validate_range(self.default_ttl_seconds, 1, 30 * 86400, "default_ttl_seconds")?;
        ConfigValidator::validate_key_prefix(&self.cache_key_prefix)?;
        if let Some(ref url) = self.redis_url {
            ConfigValidator::validate_redis_url(url)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("net", "lrcresolve", "lrcresolve")
            .ok_or(ConfigError::NoProjectDirs)?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Self::default_config_path()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn cache_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_connect_timeout_seconds)
    }

    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_seconds)
    }

    pub fn download_ttl(&self) -> Duration {
        Duration::from_secs(self.download_ttl_seconds)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_provider_contract() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(8));
        assert_eq!(config.search_ttl(), Duration::from_secs(3600));
        assert_eq!(config.download_ttl(), Duration::from_secs(86400));
        assert_eq!(config.cache_key_prefix, "lyrics_cache");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
redis_url = "redis://127.0.0.1:6379"
cache_backend = "memory"
download_ttl_seconds = 600
"#,
        )
        .unwrap();

        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert_eq!(config.cache_backend, CacheBackend::Memory);
        assert_eq!(config.download_ttl_seconds, 600);
        assert_eq!(config.search_ttl_seconds, 3600);
        assert_eq!(config.lyrics_search_url, DEFAULT_LYRICS_SEARCH_URL);
    }

    #[test]
    fn test_validate_rejects_bad_redis_url() {
        let config = Config {
            redis_url: Some("localhost:6379".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_backend_from_str() {
        assert_eq!("redis".parse::<CacheBackend>().unwrap(), CacheBackend::Auto);
        assert_eq!("Memory".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
        assert_eq!("off".parse::<CacheBackend>().unwrap(), CacheBackend::Disabled);
        assert!("memcached".parse::<CacheBackend>().is_err());
    }
}
