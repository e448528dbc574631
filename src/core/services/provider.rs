//! Provider-facing data model and the seam between the resolver and the upstream API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// Result of one network-bound resolution stage.
///
/// `Empty` means the provider answered and had nothing for us; `Unavailable` means we
/// never got a usable answer. The resolver treats both as "try the next strategy", but
/// only `Unavailable` is kept out of the cache.
#[derive(Debug)]
pub enum StageOutcome<T> {
    Found(T),
    Empty,
    Unavailable(NetworkError),
}

impl<T> StageOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            StageOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, StageOutcome::Found(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageOutcome::Found(_) => "found",
            StageOutcome::Empty => "empty",
            StageOutcome::Unavailable(_) => "unavailable",
        }
    }
}

impl<T> StageOutcome<Vec<T>> {
    /// A successful answer with no entries is reported as `Empty`
    pub fn from_list(items: Vec<T>) -> Self {
        if items.is_empty() {
            StageOutcome::Empty
        } else {
            StageOutcome::Found(items)
        }
    }
}

/// One entry of a song search response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongCandidate {
    pub hash: String,
    /// Seconds
    pub duration: i64,
}

/// One entry of a lyrics search response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsCandidate {
    pub id: String,
    #[serde(rename = "accesskey")]
    pub access_key: String,
}

/// Base64 lyric body as returned by the download endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLyricsPayload {
    pub content: String,
}

/// The two ways the lyrics search endpoint can be keyed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LyricsSearch {
    ByHash { hash: String },
    ByKeyword { keyword: String, duration_ms: Option<i64> },
}

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    async fn search_songs(&self, keyword: &str) -> StageOutcome<Vec<SongCandidate>>;

    async fn search_lyrics(&self, search: &LyricsSearch) -> StageOutcome<Vec<LyricsCandidate>>;

    async fn download_lyrics(&self, candidate: &LyricsCandidate) -> StageOutcome<RawLyricsPayload>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_list_maps_empty() {
        let empty: StageOutcome<Vec<u8>> = StageOutcome::from_list(vec![]);
        assert_eq!(empty.label(), "empty");

        let found = StageOutcome::from_list(vec![1u8]);
        assert_eq!(found.found(), Some(vec![1u8]));
    }

    #[test]
    fn test_lyrics_candidate_uses_provider_field_name() {
        let candidate = LyricsCandidate {
            id: "123".to_string(),
            access_key: "ABC".to_string(),
        };
        let json = serde_json::to_string(&candidate).unwrap();
        assert_eq!(json, r#"{"id":"123","accesskey":"ABC"}"#);
    }
}
