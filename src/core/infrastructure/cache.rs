use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock as StdRwLock;
use std::time::Duration;
use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::CacheError;

/// Raw key-value store with per-key expiry.
///
/// Implementations report failures honestly; the fail-open policy lives one level up in
/// [`Memoizer`](super::memo::Memoizer), which swallows every error returned from here.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    /// Remove every key starting with `prefix`, returning how many were removed
    async fn clear_prefix(&self, prefix: &str) -> Result<usize, CacheError>;
    fn backend_name(&self) -> &'static str;
}

// Redis cache implementation
pub struct RedisStore {
    client: RedisClient,
    op_timeout: Duration,
}

impl RedisStore {
    /// Opening a client does not touch the network; an unreachable server only shows up
    /// on the first operation.
    pub fn new(redis_url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        let client = RedisClient::open(redis_url)?;
        Ok(Self { client, op_timeout })
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>> + Send,
    {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| CacheError::Timeout)?
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.bounded(async {
            let mut con = self.client.get_async_connection().await?;
            let value: Option<String> = con.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let seconds = ttl.as_secs().max(1);
        self.bounded(async {
            let mut con = self.client.get_async_connection().await?;
            let _: () = con.set_ex(key, value, seconds).await?;
            Ok(())
        })
        .await
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let pattern = format!("{}*", prefix);
        self.bounded(async {
            let mut con = self.client.get_async_connection().await?;
            let keys: Vec<String> = con.keys(&pattern).await?;
            if !keys.is_empty() {
                let _: () = con.del(&keys).await?;
            }
            info!("Redis cache cleared, removed {} keys", keys.len());
            Ok(keys.len())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

fn poisoned() -> CacheError {
    CacheError::Unavailable("memory store lock poisoned".to_string())
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// In-process store. Expired entries are dropped on read and swept on every write.
#[derive(Default)]
pub struct MemoryStore {
    entries: StdRwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .map(|entries| entries.values().filter(|e| e.expires_at > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(|_| poisoned())?;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it so the map does not grow without bound
        if let Ok(mut entries) = self.entries.write() {
            if entries.get(key).is_some_and(|e| e.expires_at <= now) {
                debug!("Memory cache entry expired: {}", key);
                entries.remove(key);
            }
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before - entries.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
