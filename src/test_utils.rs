use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::core::infrastructure::cache::CacheStore;
use crate::core::services::{
    LyricsCandidate, LyricsProvider, LyricsSearch, RawLyricsPayload, SongCandidate, StageOutcome,
};
use crate::error::{CacheError, NetworkError};

/// Base64 body as the download endpoint would return it
pub fn lrc_payload(lines: &[&str]) -> String {
    BASE64_STANDARD.encode(lines.join("\n"))
}

pub fn song(hash: &str, duration: i64) -> SongCandidate {
    SongCandidate {
        hash: hash.to_string(),
        duration,
    }
}

pub fn candidate(id: &str, access_key: &str) -> LyricsCandidate {
    LyricsCandidate {
        id: id.to_string(),
        access_key: access_key.to_string(),
    }
}

/// Scripted provider with per-stage call counters.
///
/// Anything not scripted answers `Empty`; `unavailable()` makes every stage fail.
#[derive(Default)]
pub struct MockProvider {
    songs: Vec<SongCandidate>,
    by_hash: HashMap<String, Vec<LyricsCandidate>>,
    by_keyword: Vec<LyricsCandidate>,
    payloads: HashMap<String, String>,
    unavailable: bool,
    pub song_calls: AtomicUsize,
    pub lyrics_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    searches: Mutex<Vec<LyricsSearch>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_songs(mut self, songs: Vec<SongCandidate>) -> Self {
        self.songs = songs;
        self
    }

    pub fn with_hash_lyrics(mut self, hash: &str, candidates: Vec<LyricsCandidate>) -> Self {
        self.by_hash.insert(hash.to_string(), candidates);
        self
    }

    pub fn with_keyword_lyrics(mut self, candidates: Vec<LyricsCandidate>) -> Self {
        self.by_keyword = candidates;
        self
    }

    pub fn with_payload(mut self, id: &str, content: String) -> Self {
        self.payloads.insert(id.to_string(), content);
        self
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.song_calls.load(Ordering::SeqCst),
            self.lyrics_calls.load(Ordering::SeqCst),
            self.download_calls.load(Ordering::SeqCst),
        )
    }

    /// Every lyrics search issued so far, in order
    pub fn searches(&self) -> Vec<LyricsSearch> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl LyricsProvider for MockProvider {
    async fn search_songs(&self, _keyword: &str) -> StageOutcome<Vec<SongCandidate>> {
        self.song_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return StageOutcome::Unavailable(NetworkError::Timeout);
        }
        StageOutcome::from_list(self.songs.clone())
    }

    async fn search_lyrics(&self, search: &LyricsSearch) -> StageOutcome<Vec<LyricsCandidate>> {
        self.lyrics_calls.fetch_add(1, Ordering::SeqCst);
        self.searches.lock().unwrap().push(search.clone());
        if self.unavailable {
            return StageOutcome::Unavailable(NetworkError::Timeout);
        }
        let candidates = match search {
            LyricsSearch::ByHash { hash } => self.by_hash.get(hash).cloned().unwrap_or_default(),
            LyricsSearch::ByKeyword { .. } => self.by_keyword.clone(),
        };
        StageOutcome::from_list(candidates)
    }

    async fn download_lyrics(&self, candidate: &LyricsCandidate) -> StageOutcome<RawLyricsPayload> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return StageOutcome::Unavailable(NetworkError::Timeout);
        }
        match self.payloads.get(&candidate.id) {
            Some(content) => StageOutcome::Found(RawLyricsPayload {
                content: content.clone(),
            }),
            None => StageOutcome::Empty,
        }
    }
}

/// Store that behaves like an unreachable Redis
#[derive(Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail(&self) -> CacheError {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        CacheError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(self.fail())
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(self.fail())
    }

    async fn clear_prefix(&self, _prefix: &str) -> Result<usize, CacheError> {
        Err(self.fail())
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
