use url::Url;
use crate::error::{Result, ResolverError};

/// Centralized configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate an HTTP(S) endpoint URL
    pub fn validate_url(url: &str, field_name: &str) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| {
            ResolverError::Validation(format!("Invalid {} URL '{}': {}", field_name, url, e))
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ResolverError::Validation(format!(
                "{} URL must use http or https, got: {}",
                field_name, url
            )));
        }
        Ok(())
    }

    /// Validate numeric range
    pub fn validate_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(ResolverError::Validation(format!(
                "{} must be between {} and {}, got {}",
                field_name, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate Redis URL format
    pub fn validate_redis_url(url: &str) -> Result<()> {
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ResolverError::Validation(format!(
                "Redis URL must start with 'redis://' or 'rediss://', got: {}",
                url
            )));
        }

        Url::parse(url).map_err(|e| {
            ResolverError::Validation(format!("Invalid Redis URL '{}': {}", url, e))
        })?;
        Ok(())
    }

    /// Cache key prefixes end up inside Redis key patterns, so glob characters are rejected
    pub fn validate_key_prefix(prefix: &str) -> Result<()> {
        if prefix.is_empty() {
            return Err(ResolverError::Validation("Cache key prefix must not be empty".to_string()));
        }
        if prefix.chars().any(|c| matches!(c, '*' | '?' | '[' | ']' | ' ')) {
            return Err(ResolverError::Validation(format!(
                "Cache key prefix contains reserved characters: {}",
                prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(ConfigValidator::validate_url("https://lyrics.kugou.com/search", "lyrics search").is_ok());
        assert!(ConfigValidator::validate_url("not-a-url", "lyrics search").is_err());
        assert!(ConfigValidator::validate_url("ftp://lyrics.kugou.com", "lyrics search").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(ConfigValidator::validate_range(8u64, 1u64, 120u64, "timeout").is_ok());
        assert!(ConfigValidator::validate_range(0u64, 1u64, 120u64, "timeout").is_err());
        assert!(ConfigValidator::validate_range(500u64, 1u64, 120u64, "timeout").is_err());
    }

    #[test]
    fn test_validate_redis_url() {
        assert!(ConfigValidator::validate_redis_url("redis://localhost:6379").is_ok());
        assert!(ConfigValidator::validate_redis_url("rediss://user:pw@cache.internal:6380/0").is_ok());
        assert!(ConfigValidator::validate_redis_url("http://localhost:6379").is_err());
    }

    #[test]
    fn test_validate_key_prefix() {
        assert!(ConfigValidator::validate_key_prefix("lyrics_cache").is_ok());
        assert!(ConfigValidator::validate_key_prefix("").is_err());
        assert!(ConfigValidator::validate_key_prefix("lyrics*").is_err());
    }
}
