use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::provider::{
    LyricsCandidate, LyricsProvider, LyricsSearch, RawLyricsPayload, SongCandidate, StageOutcome,
};
use crate::config::Config;
use crate::error::NetworkError;

pub const PAGE_SIZE: usize = 8;
const SEARCH_API_VERSION: &str = "9108";

const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
];

fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// HTTP client for the Kugou song search, lyrics search and lyrics download endpoints.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct KugouClient {
    client: reqwest::Client,
    song_search_url: String,
    lyrics_search_url: String,
    lyrics_download_url: String,
}

impl KugouClient {
    pub fn new(config: &Config) -> Result<Self, NetworkError> {
        Self::with_endpoints(
            &config.song_search_url,
            &config.lyrics_search_url,
            &config.lyrics_download_url,
            config.request_timeout(),
        )
    }

    pub fn with_endpoints(
        song_search_url: &str,
        lyrics_search_url: &str,
        lyrics_download_url: &str,
        timeout: Duration,
    ) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            song_search_url: song_search_url.to_string(),
            lyrics_search_url: lyrics_search_url.to_string(),
            lyrics_download_url: lyrics_download_url.to_string(),
        })
    }

    async fn fetch_json(&self, url: &str, params: &[(&str, String)]) -> StageOutcome<Value> {
        let response = match self
            .client
            .get(url)
            .query(params)
            .header(USER_AGENT, pick_user_agent())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("Request to {} timed out", url);
                return StageOutcome::Unavailable(NetworkError::Timeout);
            }
            Err(e) => {
                warn!("Request to {} failed: {}", url, e);
                return StageOutcome::Unavailable(NetworkError::Http(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered with status {}", url, status);
            return StageOutcome::Unavailable(NetworkError::Status(status.as_u16()));
        }

        match response.json::<Value>().await {
            Ok(value) => StageOutcome::Found(value),
            Err(e) => {
                warn!("{} returned a non-JSON body: {}", url, e);
                StageOutcome::Unavailable(NetworkError::InvalidResponse {
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl LyricsProvider for KugouClient {
    async fn search_songs(&self, keyword: &str) -> StageOutcome<Vec<SongCandidate>> {
        debug!("Searching songs for keyword: {}", keyword);
        let params = [
            ("version", SEARCH_API_VERSION.to_string()),
            ("plat", "0".to_string()),
            ("pagesize", PAGE_SIZE.to_string()),
            ("keyword", keyword.to_string()),
        ];
        match self.fetch_json(&self.song_search_url, &params).await {
            StageOutcome::Found(body) => parse_song_search(&body),
            StageOutcome::Empty => StageOutcome::Empty,
            StageOutcome::Unavailable(e) => StageOutcome::Unavailable(e),
        }
    }

    async fn search_lyrics(&self, search: &LyricsSearch) -> StageOutcome<Vec<LyricsCandidate>> {
        let params = lyrics_search_params(search);
        match self.fetch_json(&self.lyrics_search_url, &params).await {
            StageOutcome::Found(body) => parse_lyrics_search(&body),
            StageOutcome::Empty => StageOutcome::Empty,
            StageOutcome::Unavailable(e) => StageOutcome::Unavailable(e),
        }
    }

    async fn download_lyrics(&self, candidate: &LyricsCandidate) -> StageOutcome<RawLyricsPayload> {
        debug!("Downloading lyrics id={}", candidate.id);
        let params = [
            ("fmt", "lrc".to_string()),
            ("charset", "utf8".to_string()),
            ("client", "pc".to_string()),
            ("ver", "1".to_string()),
            ("id", candidate.id.clone()),
            ("accesskey", candidate.access_key.clone()),
        ];
        match self.fetch_json(&self.lyrics_download_url, &params).await {
            StageOutcome::Found(body) => parse_download(&body),
            StageOutcome::Empty => StageOutcome::Empty,
            StageOutcome::Unavailable(e) => StageOutcome::Unavailable(e),
        }
    }
}

/// Query string for the lyrics search endpoint. A zero duration is left out, any other
/// value (negative included) is sent as-is.
fn lyrics_search_params(search: &LyricsSearch) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("ver", "1".to_string()),
        ("man", "yes".to_string()),
        ("client", "pc".to_string()),
    ];
    match search {
        LyricsSearch::ByHash { hash } => {
            debug!("Searching lyrics by hash: {}", hash);
            params.push(("hash", hash.clone()));
        }
        LyricsSearch::ByKeyword { keyword, duration_ms } => {
            debug!("Searching lyrics by keyword: {} ({:?} ms)", keyword, duration_ms);
            if !keyword.is_empty() {
                params.push(("keyword", keyword.clone()));
            }
            if let Some(ms) = duration_ms.filter(|ms| *ms != 0) {
                params.push(("duration", ms.to_string()));
            }
        }
    }
    params
}

/// Strings and numbers both show up for ids across provider versions
fn value_as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn parse_song_search(body: &Value) -> StageOutcome<Vec<SongCandidate>> {
    let Some(info) = body.pointer("/data/info").and_then(Value::as_array) else {
        return StageOutcome::Unavailable(NetworkError::InvalidResponse {
            reason: "song search response has no data.info list".to_string(),
        });
    };

    let songs = info
        .iter()
        .filter_map(|song| {
            let hash = value_as_string(song.get("hash"))?;
            let duration = value_as_i64(song.get("duration")).unwrap_or(0);
            Some(SongCandidate { hash, duration })
        })
        .collect();

    StageOutcome::from_list(songs)
}

pub(crate) fn parse_lyrics_search(body: &Value) -> StageOutcome<Vec<LyricsCandidate>> {
    let Some(candidates) = body.get("candidates").and_then(Value::as_array) else {
        return StageOutcome::Unavailable(NetworkError::InvalidResponse {
            reason: "lyrics search response has no candidates list".to_string(),
        });
    };

    let candidates = candidates
        .iter()
        .filter_map(|candidate| {
            Some(LyricsCandidate {
                id: value_as_string(candidate.get("id"))?,
                access_key: value_as_string(candidate.get("accesskey"))?,
            })
        })
        .collect();

    StageOutcome::from_list(candidates)
}

pub(crate) fn parse_download(body: &Value) -> StageOutcome<RawLyricsPayload> {
    match body.get("content").and_then(Value::as_str).map(str::trim) {
        Some(content) if !content.is_empty() => StageOutcome::Found(RawLyricsPayload {
            content: content.to_string(),
        }),
        Some(_) => StageOutcome::Empty,
        None => StageOutcome::Unavailable(NetworkError::InvalidResponse {
            reason: "download response has no content field".to_string(),
        }),
    }
}
