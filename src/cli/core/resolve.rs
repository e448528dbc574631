use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::core::lyrics::CleanedLyrics;
use crate::core::{Query, Resolution};
use crate::error::{LyricsError, ResolverError, Result};
use crate::services::ResolverContext;

#[derive(Args)]
pub struct ResolveArgs {
    /// Song title
    #[arg(value_name = "TITLE")]
    title: String,

    /// Artist name
    #[arg(short, long)]
    artist: Option<String>,

    /// Duration in seconds; anything that is not an integer matches any length
    #[arg(short, long)]
    duration: Option<String>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: String,
}

/// Response envelope shared by `resolve --format json` and batch reports
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LyricsResponse {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LyricsResponse {
    pub fn found(lyrics: &CleanedLyrics) -> Self {
        Self {
            code: 200,
            lyrics: Some(lyrics.to_text()),
            message: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            code: 404,
            lyrics: None,
            message: Some(LyricsError::NotFound.to_string()),
        }
    }

    pub fn missing_title() -> Self {
        Self {
            code: 400,
            lyrics: None,
            message: Some(LyricsError::MissingTitle.to_string()),
        }
    }

    pub fn from_outcome(outcome: &Result<Resolution>) -> Self {
        match outcome {
            Ok(Resolution::Found(lyrics)) => Self::found(lyrics),
            Ok(Resolution::NotFound) => Self::not_found(),
            Err(ResolverError::Lyrics(LyricsError::MissingTitle)) => Self::missing_title(),
            Err(e) => Self {
                code: 500,
                lyrics: None,
                message: Some(e.to_string()),
            },
        }
    }
}

pub async fn execute(args: ResolveArgs, ctx: &ResolverContext) -> Result<()> {
    let json = match args.format.as_str() {
        "text" => false,
        "json" => true,
        other => {
            return Err(ResolverError::Validation(format!(
                "Unknown format: {}. Available: text, json",
                other
            )))
        }
    };

    let duration = Query::parse_duration(args.duration.as_deref());
    info!("🔍 Resolving lyrics for: {}", args.title);

    let outcome = ctx
        .resolve_lyrics(&args.title, args.artist.as_deref(), Some(duration))
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&LyricsResponse::from_outcome(&outcome))?);
    }

    match outcome? {
        Resolution::Found(lyrics) => {
            if !json {
                println!("{}", lyrics);
            }
            Ok(())
        }
        Resolution::NotFound => Err(LyricsError::NotFound.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes() {
        let lyrics = CleanedLyrics::from_lines(vec![
            "[00:01.00]a".to_string(),
            "[00:02.00]b".to_string(),
        ])
        .unwrap();

        let found = serde_json::to_value(LyricsResponse::from_outcome(&Ok(Resolution::Found(lyrics)))).unwrap();
        assert_eq!(found, serde_json::json!({"code": 200, "lyrics": "[00:01.00]a\n[00:02.00]b"}));

        let missing = serde_json::to_value(LyricsResponse::from_outcome(&Ok(Resolution::NotFound))).unwrap();
        assert_eq!(missing, serde_json::json!({"code": 404, "message": "Lyrics not found"}));

        let invalid = serde_json::to_value(LyricsResponse::from_outcome(&Err(
            LyricsError::MissingTitle.into(),
        )))
        .unwrap();
        assert_eq!(invalid, serde_json::json!({"code": 400, "message": "Missing title"}));
    }
}
