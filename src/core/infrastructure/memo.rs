use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use data_encoding::HEXLOWER;
use ring::digest::{digest, SHA256};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::cache::CacheStore;
use crate::core::services::StageOutcome;
use crate::error::CacheError;

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub store_errors: u64,
    pub hit_rate_percent: f64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    store_errors: AtomicU64,
}

/// Content-addressed memoization over an optional [`CacheStore`].
///
/// Fails open: every store error is logged and counted, then treated as a miss (on read)
/// or ignored (on write). The wrapped call always runs when nothing usable is cached.
pub struct Memoizer {
    store: Option<Arc<dyn CacheStore>>,
    prefix: String,
    default_ttl: Duration,
    counters: Counters,
}

impl Memoizer {
    pub fn new(store: Arc<dyn CacheStore>, prefix: &str, default_ttl: Duration) -> Self {
        Self {
            store: Some(store),
            prefix: prefix.to_string(),
            default_ttl,
            counters: Counters::default(),
        }
    }

    /// Pass-through memoizer used when no store is configured
    pub fn disabled(default_ttl: Duration) -> Self {
        Self {
            store: None,
            prefix: String::new(),
            default_ttl,
            counters: Counters::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// `{prefix}:{sha256(func ":" json(args))}`. Struct fields serialize in declaration
    /// order and JSON maps are sorted, so equal arguments always produce equal keys.
    pub fn cache_key<A: Serialize + ?Sized>(&self, func: &str, args: &A) -> Option<String> {
        let args_json = match serde_json::to_string(args) {
            Ok(json) => json,
            Err(e) => {
                warn!("Cannot derive cache key for {}: {}", func, e);
                return None;
            }
        };
        let raw = format!("{}:{}", func, args_json);
        let hashed = digest(&SHA256, raw.as_bytes());
        Some(format!("{}:{}", self.prefix, HEXLOWER.encode(hashed.as_ref())))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Cache read failed, continuing uncached: {}", e);
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize value for caching: {}", e);
                return;
            }
        };
        let ttl = ttl.unwrap_or(self.default_ttl);
        match store.set_ex(key, &raw, ttl).await {
            Ok(()) => {
                self.counters.writes.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Cache write failed, result not cached: {}", e);
            }
        }
    }

    /// Run `call` unless a result for `(func, args)` is cached. Any answer from the
    /// provider is stored, an empty one as `null`; only `Unavailable` is retried on the
    /// next request.
    pub async fn memoize<A, T, F, Fut>(
        &self,
        func: &str,
        args: &A,
        ttl: Option<Duration>,
        call: F,
    ) -> StageOutcome<T>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StageOutcome<T>>,
    {
        if self.store.is_none() {
            return call().await;
        }
        let Some(key) = self.cache_key(func, args) else {
            return call().await;
        };

        if let Some(cached) = self.get::<Option<T>>(&key).await {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {} ({})", func, key);
            return match cached {
                Some(value) => StageOutcome::Found(value),
                None => StageOutcome::Empty,
            };
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for {} ({})", func, key);

        let outcome = call().await;
        match &outcome {
            StageOutcome::Found(value) => self.set(&key, &Some(value), ttl).await,
            StageOutcome::Empty => self.set(&key, &None::<&T>, ttl).await,
            StageOutcome::Unavailable(_) => {}
        }
        outcome
    }

    /// Drop every key in this memoizer's namespace
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let store = self.store.as_ref().ok_or(CacheError::NotConfigured)?;
        store.clear_prefix(&format!("{}:", self.prefix)).await
    }

    /// Write and read back a short-lived key, returning the round-trip time
    pub async fn probe(&self) -> Result<Duration, CacheError> {
        let store = self.store.as_ref().ok_or(CacheError::NotConfigured)?;
        let key = format!("{}:probe", self.prefix);
        let started = tokio::time::Instant::now();
        store.set_ex(&key, "1", Duration::from_secs(5)).await?;
        match store.get(&key).await? {
            Some(_) => Ok(started.elapsed()),
            None => Err(CacheError::Unavailable("probe key was not readable".to_string())),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        CacheStats {
            backend: self.store.as_ref().map(|s| s.backend_name()).unwrap_or("disabled"),
            hits,
            misses,
            writes: self.counters.writes.load(Ordering::Relaxed),
            store_errors: self.counters.store_errors.load(Ordering::Relaxed),
            hit_rate_percent: if lookups > 0 {
                (hits as f64 / lookups as f64) * 100.0
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::infrastructure::cache::MemoryStore;
    use crate::test_utils::FailingStore;
    use serde::Serialize;
    use std::sync::atomic::AtomicUsize;

    fn memory_memoizer() -> (Memoizer, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let memo = Memoizer::new(store.clone(), "lyrics_cache", Duration::from_secs(3600));
        (memo, store)
    }

    #[derive(Serialize)]
    struct SearchArgs<'a> {
        keyword: &'a str,
        duration_ms: Option<i64>,
    }

    #[test]
    fn test_cache_key_is_stable_and_namespaced() {
        let (memo, _) = memory_memoizer();
        let args = SearchArgs { keyword: "Song - Artist", duration_ms: Some(200_000) };

        let a = memo.cache_key("search_lyrics", &args).unwrap();
        let b = memo.cache_key("search_lyrics", &args).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("lyrics_cache:"));
        // prefix + ':' + 64 hex chars of SHA-256
        assert_eq!(a.len(), "lyrics_cache:".len() + 64);
    }

    #[test]
    fn test_cache_key_depends_on_function_and_args() {
        let (memo, _) = memory_memoizer();
        let base = memo.cache_key("search_songs", "abc").unwrap();
        assert_ne!(base, memo.cache_key("search_lyrics", "abc").unwrap());
        assert_ne!(base, memo.cache_key("search_songs", "abd").unwrap());
    }

    #[tokio::test]
    async fn test_memoize_serves_second_call_from_cache() {
        let (memo, store) = memory_memoizer();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let outcome = memo
                .memoize("search_songs", "abc", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    StageOutcome::Found(vec!["hash-1".to_string()])
                })
                .await;
            assert_eq!(outcome.found(), Some(vec!["hash-1".to_string()]));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
        let stats = memo.stats();
        assert_eq!((stats.hits, stats.misses, stats.writes), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_memoize_stores_empty_answers() {
        let (memo, store) = memory_memoizer();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let outcome: StageOutcome<Vec<String>> = memo
                .memoize("search_songs", "nothing", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    StageOutcome::Empty
                })
                .await;
            assert_eq!(outcome.label(), "empty");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
        let key = memo.cache_key("search_songs", "nothing").unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("null"));
    }

    #[tokio::test]
    async fn test_memoize_never_stores_unavailable() {
        let (memo, store) = memory_memoizer();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let outcome: StageOutcome<String> = memo
                .memoize("download_lyrics", "x", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    StageOutcome::Unavailable(crate::error::NetworkError::Timeout)
                })
                .await;
            assert_eq!(outcome.label(), "unavailable");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty());
        assert_eq!(memo.stats().writes, 0);
    }

    async fn memoized_count(memo: &Memoizer, calls: &AtomicUsize) -> StageOutcome<u32> {
        memo.memoize("search_songs", "abc", Some(Duration::from_secs(60)), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            StageOutcome::Found(1u32)
        })
        .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_memoize_respects_ttl() {
        let (memo, _) = memory_memoizer();
        let calls = AtomicUsize::new(0);

        memoized_count(&memo, &calls).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        memoized_count(&memo, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        memoized_count(&memo, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_store_is_fail_open() {
        let store = Arc::new(FailingStore::default());
        let memo = Memoizer::new(store.clone(), "lyrics_cache", Duration::from_secs(3600));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let outcome = memo
                .memoize("search_songs", "abc", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    StageOutcome::Found(7u32)
                })
                .await;
            assert_eq!(outcome.found(), Some(7));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // one failed read and one failed write per call
        assert_eq!(memo.stats().store_errors, 4);
        assert_eq!(store.attempts(), 4);
    }

    #[tokio::test]
    async fn test_disabled_memoizer_passes_through() {
        let memo = Memoizer::disabled(Duration::from_secs(3600));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            memo.memoize("search_songs", "abc", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                StageOutcome::Found(1u8)
            })
            .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(memo.stats().backend, "disabled");
        assert!(matches!(memo.clear().await, Err(CacheError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_probe() {
        let (memo, _) = memory_memoizer();
        assert!(memo.probe().await.is_ok());

        let failing = Memoizer::new(
            Arc::new(FailingStore::default()),
            "lyrics_cache",
            Duration::from_secs(3600),
        );
        assert!(failing.probe().await.is_err());
        assert!(matches!(
            Memoizer::disabled(Duration::from_secs(1)).probe().await,
            Err(CacheError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let (memo, store) = memory_memoizer();
        let key = memo.cache_key("search_songs", "abc").unwrap();
        store.set_ex(&key, "not json", Duration::from_secs(60)).await.unwrap();

        let outcome = memo
            .memoize("search_songs", "abc", None, || async { StageOutcome::Found(3u32) })
            .await;
        assert_eq!(outcome.found(), Some(3));
        assert_eq!(memo.get::<u32>(&key).await, Some(3));
    }
}
