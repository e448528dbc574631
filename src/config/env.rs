use std::env;
use crate::error::{Result, ResolverError};

/// Environment variable configuration constants
pub struct EnvVars;

impl EnvVars {
    pub const REDIS_URL: &'static str = "LRCRESOLVE_REDIS_URL";
    pub const CACHE_BACKEND: &'static str = "LRCRESOLVE_CACHE_BACKEND";
    pub const SONG_SEARCH_URL: &'static str = "LRCRESOLVE_SONG_SEARCH_URL";
    pub const LYRICS_SEARCH_URL: &'static str = "LRCRESOLVE_LYRICS_SEARCH_URL";
    pub const LYRICS_DOWNLOAD_URL: &'static str = "LRCRESOLVE_LYRICS_DOWNLOAD_URL";
    pub const REQUEST_TIMEOUT_SECONDS: &'static str = "LRCRESOLVE_REQUEST_TIMEOUT_SECONDS";
    pub const CACHE_CONNECT_TIMEOUT_SECONDS: &'static str = "LRCRESOLVE_CACHE_CONNECT_TIMEOUT_SECONDS";
    pub const SEARCH_TTL_SECONDS: &'static str = "LRCRESOLVE_SEARCH_TTL_SECONDS";
    pub const DOWNLOAD_TTL_SECONDS: &'static str = "LRCRESOLVE_DOWNLOAD_TTL_SECONDS";
    pub const DEFAULT_TTL_SECONDS: &'static str = "LRCRESOLVE_DEFAULT_TTL_SECONDS";
    pub const CACHE_KEY_PREFIX: &'static str = "LRCRESOLVE_CACHE_KEY_PREFIX";

    // Conventional name used by hosting platforms
    pub const PLATFORM_REDIS_URL: &'static str = "REDIS_URL";
}

/// Environment variable parsing utilities with validation
pub struct EnvParser;

impl EnvParser {
    /// Parse environment variable as a trimmed, non-empty string
    pub fn parse_string(var_name: &str, validator: Option<fn(&str) -> Result<()>>) -> Result<Option<String>> {
        match env::var(var_name) {
            Ok(value) => {
                let trimmed = value.trim().to_string();
                if trimmed.is_empty() {
                    return Ok(None);
                }

                if let Some(validate_fn) = validator {
                    validate_fn(&trimmed)?;
                }

                Ok(Some(trimmed))
            }
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(ResolverError::Validation(format!(
                    "Environment variable {} contains invalid UTF-8",
                    var_name
                )))
            }
        }
    }

    /// Parse environment variable as u64 with range validation
    pub fn parse_u64(var_name: &str, min: u64, max: u64) -> Result<Option<u64>> {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            let value = value_str.parse::<u64>().map_err(|_| {
                ResolverError::Validation(format!(
                    "Invalid number in {}: '{}'. Must be a positive integer",
                    var_name, value_str
                ))
            })?;

            if value < min || value > max {
                return Err(ResolverError::Validation(format!(
                    "Value in {} must be between {} and {}, got {}",
                    var_name, min, max, value
                )));
            }

            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// First non-empty value among several variable names, in priority order
    pub fn first_of(var_names: &[&str]) -> Result<Option<String>> {
        for name in var_names {
            if let Some(value) = Self::parse_string(name, None)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Get all LRCRESOLVE environment variables for debugging
    pub fn get_all_lrcresolve_vars() -> Vec<(String, String)> {
        env::vars()
            .filter(|(key, _)| key.starts_with("LRCRESOLVE_"))
            .collect()
    }
}
