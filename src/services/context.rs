use std::sync::Arc;

use super::factory::ServiceFactory;
use crate::config::Config;
use crate::core::infrastructure::{CacheStats, Memoizer};
use crate::core::{LyricsResolver, Resolution};
use crate::error::{CacheError, Result};

/// Everything a resolution needs, built once at startup and shared across tasks
#[derive(Clone)]
pub struct ResolverContext {
    config: Arc<Config>,
    memo: Arc<Memoizer>,
    resolver: Arc<LyricsResolver>,
}

impl ResolverContext {
    pub fn new(config: Config) -> Result<Self> {
        let factory = ServiceFactory::new(Arc::new(config));
        let memo = Arc::new(factory.create_memoizer());
        let resolver = Arc::new(factory.create_resolver(memo.clone())?);

        Ok(Self {
            config: factory.config(),
            memo,
            resolver,
        })
    }

    pub fn from_parts(config: Arc<Config>, memo: Arc<Memoizer>, resolver: LyricsResolver) -> Self {
        Self {
            config,
            memo,
            resolver: Arc::new(resolver),
        }
    }

    pub async fn resolve_lyrics(
        &self,
        title: &str,
        artist: Option<&str>,
        duration: Option<i64>,
    ) -> Result<Resolution> {
        self.resolver.resolve_lyrics(title, artist, duration).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.memo.stats()
    }

    pub fn cache_enabled(&self) -> bool {
        self.memo.is_enabled()
    }

    pub async fn probe_cache(&self) -> std::result::Result<std::time::Duration, CacheError> {
        self.memo.probe().await
    }

    pub async fn clear_cache(&self) -> std::result::Result<usize, CacheError> {
        self.memo.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheBackend;
    use crate::core::ResolverSettings;
    use crate::core::infrastructure::MemoryStore;
    use crate::test_utils::{candidate, lrc_payload, song, MockProvider};
    use std::time::Duration;

    fn mock_context() -> ResolverContext {
        let provider = Arc::new(
            MockProvider::new()
                .with_songs(vec![song("H", 180)])
                .with_hash_lyrics("H", vec![candidate("1", "K")])
                .with_payload("1", lrc_payload(&["[00:01.00]hello", "[00:02.00]world"])),
        );
        let memo = Arc::new(Memoizer::new(
            Arc::new(MemoryStore::new()),
            "lyrics_cache",
            Duration::from_secs(3600),
        ));
        let resolver = LyricsResolver::new(provider, memo.clone(), ResolverSettings::default());
        ResolverContext::from_parts(Arc::new(Config::default()), memo, resolver)
    }

    #[tokio::test]
    async fn test_context_is_shared_across_tasks() {
        let ctx = mock_context();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ctx = ctx.clone();
                tokio::spawn(async move { ctx.resolve_lyrics("Song", None, Some(180)).await })
            })
            .collect();

        for handle in handles {
            let resolution = handle.await.unwrap().unwrap();
            assert_eq!(resolution.lyrics().unwrap().len(), 2);
        }
        let stats = ctx.cache_stats();
        assert_eq!(stats.hits + stats.misses, 12);
    }

    #[tokio::test]
    async fn test_clear_cache_empties_namespace() {
        let ctx = mock_context();
        ctx.resolve_lyrics("Song", None, None).await.unwrap();
        assert_eq!(ctx.clear_cache().await.unwrap(), 3);
    }

    #[test]
    fn test_new_from_config_without_cache() {
        let config = Config {
            cache_backend: CacheBackend::Disabled,
            ..Config::default()
        };
        let ctx = ResolverContext::new(config).unwrap();
        assert!(!ctx.cache_enabled());
        assert_eq!(ctx.config().cache_key_prefix, "lyrics_cache");
    }
}
