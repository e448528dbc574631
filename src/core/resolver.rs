use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::infrastructure::Memoizer;
use crate::core::lyrics::{normalize_artist, normalize_content, normalize_title, CleanedLyrics};
use crate::core::services::{
    LyricsCandidate, LyricsProvider, LyricsSearch, RawLyricsPayload, SongCandidate, StageOutcome,
};
use crate::error::{LyricsError, Result};

/// Maximum difference in seconds between the query and a candidate song, inclusive
pub const DURATION_TOLERANCE: i64 = 8;

/// Duration value meaning "match any length"
pub const UNCONSTRAINED_DURATION: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub title: String,
    pub artist: Option<String>,
    /// Seconds, or [`UNCONSTRAINED_DURATION`]
    pub duration: i64,
}

impl Query {
    pub fn new(title: &str, artist: Option<&str>, duration: Option<i64>) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LyricsError::MissingTitle.into());
        }
        let artist = artist
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Ok(Self {
            title: title.to_string(),
            artist,
            duration: duration.unwrap_or(UNCONSTRAINED_DURATION),
        })
    }

    /// Lenient parse of a user-supplied duration; anything that is not an integer is unconstrained
    pub fn parse_duration(raw: Option<&str>) -> i64 {
        raw.and_then(|d| d.trim().parse::<i64>().ok())
            .unwrap_or(UNCONSTRAINED_DURATION)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.duration == UNCONSTRAINED_DURATION
    }

    pub fn matches_duration(&self, song_duration: i64) -> bool {
        self.is_unconstrained()
            || song_duration.abs_diff(self.duration) <= DURATION_TOLERANCE.unsigned_abs()
    }

    /// Search keyword built from the normalized title and artist
    pub fn keyword(&self) -> String {
        let title = normalize_title(&self.title);
        match &self.artist {
            Some(artist) => format!("{} - {}", title, normalize_artist(artist)),
            None => title,
        }
    }

    /// Omitted when unconstrained or too large to express in milliseconds
    fn duration_ms(&self) -> Option<i64> {
        if self.is_unconstrained() {
            None
        } else {
            self.duration.checked_mul(1000)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(CleanedLyrics),
    NotFound,
}

impl Resolution {
    pub fn lyrics(&self) -> Option<&CleanedLyrics> {
        match self {
            Resolution::Found(lyrics) => Some(lyrics),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    pub search_ttl: Duration,
    pub download_ttl: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            search_ttl: Duration::from_secs(3600),
            download_ttl: Duration::from_secs(86400),
        }
    }
}

impl From<&Config> for ResolverSettings {
    fn from(config: &Config) -> Self {
        Self {
            search_ttl: config.search_ttl(),
            download_ttl: config.download_ttl(),
        }
    }
}

/// Resolves a title/artist/duration query to cleaned lyric lines.
///
/// Every provider call goes through the memoizer, so repeated queries within the TTL
/// window are answered from the cache stage by stage.
pub struct LyricsResolver {
    provider: Arc<dyn LyricsProvider>,
    memo: Arc<Memoizer>,
    settings: ResolverSettings,
}

impl LyricsResolver {
    pub fn new(
        provider: Arc<dyn LyricsProvider>,
        memo: Arc<Memoizer>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            provider,
            memo,
            settings,
        }
    }

    pub fn memoizer(&self) -> &Arc<Memoizer> {
        &self.memo
    }

    /// Rejects a missing title; every provider failure ends in `NotFound` rather than an error
    pub async fn resolve_lyrics(
        &self,
        title: &str,
        artist: Option<&str>,
        duration: Option<i64>,
    ) -> Result<Resolution> {
        let query = Query::new(title, artist, duration)?;
        Ok(self.resolve(&query).await)
    }

    pub async fn resolve(&self, query: &Query) -> Resolution {
        let keyword = query.keyword();
        info!("Resolving lyrics for '{}' (duration {})", keyword, query.duration);

        let winner = match self.match_by_hash(query, &keyword).await {
            Some(candidate) => Some(candidate),
            None => self.match_by_keyword(query, &keyword).await,
        };

        let Some(candidate) = winner else {
            info!("No lyrics candidate for '{}'", keyword);
            return Resolution::NotFound;
        };

        let payload = match self.download(&candidate).await {
            StageOutcome::Found(payload) => payload,
            other => {
                debug!("Download for id={} was {}", candidate.id, other.label());
                return Resolution::NotFound;
            }
        };

        match normalize_content(&payload.content) {
            Some(lyrics) => {
                info!("Resolved {} lyric lines for '{}'", lyrics.len(), keyword);
                Resolution::Found(lyrics)
            }
            None => {
                info!("Lyrics for '{}' had no usable timed lines", keyword);
                Resolution::NotFound
            }
        }
    }

    /// First duration-compatible song, in provider order, whose hash has lyrics
    async fn match_by_hash(&self, query: &Query, keyword: &str) -> Option<LyricsCandidate> {
        let songs = match self.search_songs(keyword).await {
            StageOutcome::Found(songs) => songs,
            StageOutcome::Empty => {
                debug!("Song search for '{}' returned nothing", keyword);
                return None;
            }
            StageOutcome::Unavailable(e) => {
                warn!("Song search unavailable, falling back to keyword search: {}", e);
                return None;
            }
        };

        for song in songs.iter().filter(|s| query.matches_duration(s.duration)) {
            let search = LyricsSearch::ByHash {
                hash: song.hash.clone(),
            };
            match self.search_lyrics(&search).await {
                StageOutcome::Found(mut candidates) if !candidates.is_empty() => {
                    debug!("Lyrics matched by hash {}", song.hash);
                    return Some(candidates.swap_remove(0));
                }
                StageOutcome::Unavailable(e) => {
                    debug!("Lyrics search for hash {} unavailable: {}", song.hash, e);
                }
                _ => {}
            }
        }

        debug!(
            "None of {} songs matched duration {} with lyrics",
            songs.len(),
            query.duration
        );
        None
    }

    async fn match_by_keyword(&self, query: &Query, keyword: &str) -> Option<LyricsCandidate> {
        let search = LyricsSearch::ByKeyword {
            keyword: keyword.to_string(),
            duration_ms: query.duration_ms(),
        };
        match self.search_lyrics(&search).await {
            StageOutcome::Found(candidates) => candidates.into_iter().next(),
            StageOutcome::Empty => None,
            StageOutcome::Unavailable(e) => {
                warn!("Keyword lyrics search unavailable: {}", e);
                None
            }
        }
    }

    async fn search_songs(&self, keyword: &str) -> StageOutcome<Vec<SongCandidate>> {
        self.memo
            .memoize("search_songs", keyword, Some(self.settings.search_ttl), || {
                self.provider.search_songs(keyword)
            })
            .await
    }

    async fn search_lyrics(&self, search: &LyricsSearch) -> StageOutcome<Vec<LyricsCandidate>> {
        self.memo
            .memoize("search_lyrics", search, Some(self.settings.search_ttl), || {
                self.provider.search_lyrics(search)
            })
            .await
    }

    async fn download(&self, candidate: &LyricsCandidate) -> StageOutcome<RawLyricsPayload> {
        self.memo
            .memoize("download_lyrics", candidate, Some(self.settings.download_ttl), || {
                self.provider.download_lyrics(candidate)
            })
            .await
    }
}
