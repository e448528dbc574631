use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{CacheBackend, Config};
use crate::core::infrastructure::{CacheStore, Memoizer, MemoryStore, RedisStore};
use crate::core::services::KugouClient;
use crate::core::{LyricsResolver, ResolverSettings};
use crate::error::Result;

/// Builds the resolver's collaborators from configuration
pub struct ServiceFactory {
    config: Arc<Config>,
}

impl ServiceFactory {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// `None` means caching is off. A Redis URL that cannot be opened downgrades to
    /// no caching instead of failing startup.
    pub fn create_cache_store(&self) -> Option<Arc<dyn CacheStore>> {
        match self.config.cache_backend {
            CacheBackend::Disabled => None,
            CacheBackend::Memory => Some(Arc::new(MemoryStore::new())),
            CacheBackend::Auto => {
                let url = self.config.redis_url.as_deref()?;
                match RedisStore::new(url, self.config.cache_connect_timeout()) {
                    Ok(store) => Some(Arc::new(store)),
                    Err(e) => {
                        warn!("Redis cache unavailable, running uncached: {}", e);
                        None
                    }
                }
            }
        }
    }

    pub fn create_memoizer(&self) -> Memoizer {
        match self.create_cache_store() {
            Some(store) => {
                info!("Memoizing provider calls in {} store", store.backend_name());
                Memoizer::new(
                    store,
                    &self.config.cache_key_prefix,
                    self.config.default_ttl(),
                )
            }
            None => {
                info!("No cache store configured, provider calls are not memoized");
                Memoizer::disabled(self.config.default_ttl())
            }
        }
    }

    pub fn create_provider(&self) -> Result<KugouClient> {
        Ok(KugouClient::new(&self.config)?)
    }

    pub fn create_resolver(&self, memo: Arc<Memoizer>) -> Result<LyricsResolver> {
        let provider = Arc::new(self.create_provider()?);
        Ok(LyricsResolver::new(
            provider,
            memo,
            ResolverSettings::from(self.config.as_ref()),
        ))
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory_with(backend: CacheBackend, redis_url: Option<&str>) -> ServiceFactory {
        let config = Config {
            cache_backend: backend,
            redis_url: redis_url.map(str::to_string),
            ..Config::default()
        };
        ServiceFactory::new(Arc::new(config))
    }

    #[test]
    fn test_auto_without_redis_url_disables_cache() {
        let memo = factory_with(CacheBackend::Auto, None).create_memoizer();
        assert!(!memo.is_enabled());
    }

    #[test]
    fn test_auto_with_redis_url_uses_redis() {
        let store = factory_with(CacheBackend::Auto, Some("redis://127.0.0.1:6379/0"))
            .create_cache_store()
            .unwrap();
        assert_eq!(store.backend_name(), "redis");
    }

    #[test]
    fn test_memory_backend() {
        let memo = factory_with(CacheBackend::Memory, Some("redis://127.0.0.1:6379/0")).create_memoizer();
        assert!(memo.is_enabled());
        assert_eq!(memo.stats().backend, "memory");
        assert_eq!(memo.prefix(), "lyrics_cache");
    }

    #[test]
    fn test_disabled_backend_ignores_redis_url() {
        let factory = factory_with(CacheBackend::Disabled, Some("redis://127.0.0.1:6379/0"));
        assert!(factory.create_cache_store().is_none());
    }
}
