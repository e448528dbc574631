//! Query and content normalization
//!
//! Titles and artists are cleaned before they are used as search keywords; downloaded
//! lyric bodies are decoded and reduced to their time-tagged lines, with credit lines
//! embedded at the head and tail of the transcript removed.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// How far into each end of the transcript credit lines are looked for
pub const HEAD_CUT_LIMIT: usize = 30;

pub const ARTIST_SEPARATOR: &str = "、";

// Accepts unpadded input and non-zero trailing bits
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static TITLE_ANNOTATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(.*\)|（.*）|「.*」|『.*』|<.*>|《.*》|〈.*〉|＜.*＞")
        .expect("title annotation regex")
});

static ARTIST_ANNOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(.*\)|（.*）").expect("artist annotation regex"));

static TIMED_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[\d{1,2}:\d{1,2}\.\d{2,3}\]").expect("timed line regex")
});

// Credit lines such as "[00:01.00]作词：someone"
static CREDIT_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+\].+[:：].+").expect("credit line regex"));

const HTML_ENTITIES: [(&str, &str); 5] = [
    ("&apos;", "'"),
    ("&quot;", "\""),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
];

pub fn normalize_title(title: &str) -> String {
    TITLE_ANNOTATION_RE
        .replace_all(title.trim(), "")
        .trim()
        .to_string()
}

pub fn normalize_artist(artist: &str) -> String {
    let joined = artist
        .trim()
        .replace(", ", ARTIST_SEPARATOR)
        .replace(" & ", ARTIST_SEPARATOR)
        .replace('.', "")
        .replace('和', ARTIST_SEPARATOR);
    ARTIST_ANNOTATION_RE
        .replace_all(&joined, "")
        .trim()
        .to_string()
}

/// Ordered, non-empty set of time-tagged lyric lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CleanedLyrics {
    lines: Vec<String>,
}

impl CleanedLyrics {
    /// `None` for an empty set, so "found but empty" cannot be represented
    pub fn from_lines(lines: Vec<String>) -> Option<Self> {
        if lines.is_empty() {
            None
        } else {
            Some(Self { lines })
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for CleanedLyrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Decode a base64 lyric body. Characters outside the alphabet (line wrapping, stray
/// padding) are skipped, and invalid UTF-8 sequences are dropped rather than rejected.
pub fn decode_payload(base64_content: &str) -> Option<String> {
    let filtered: String = base64_content
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '+' || *c == '/')
        .collect();
    let bytes = match LENIENT_BASE64.decode(filtered) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Lyrics payload is not valid base64: {}", e);
            return None;
        }
    };
    let text: String = bytes.utf8_chunks().map(|chunk| chunk.valid()).collect();
    Some(text)
}

fn unescape_entities(text: &str) -> String {
    HTML_ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, plain)| acc.replace(entity, plain))
}

pub fn normalize_content(base64_content: &str) -> Option<CleanedLyrics> {
    if base64_content.trim().is_empty() {
        return None;
    }
    let decoded = decode_payload(base64_content)?;
    let text = unescape_entities(&decoded);
    clean_lines(&text)
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Keep time-tagged lines and cut credit blocks off both ends
pub fn clean_lines(text: &str) -> Option<CleanedLyrics> {
    let lines: Vec<&str> = text
        .split(is_line_break)
        .filter(|line| TIMED_LINE_RE.is_match(line))
        .collect();
    if lines.is_empty() {
        return None;
    }

    // The last credit line within the head window marks where the lyrics begin
    let head_cut = (0..=HEAD_CUT_LIMIT.min(lines.len() - 1))
        .rev()
        .find(|&i| CREDIT_LINE_RE.is_match(lines[i]))
        .map_or(0, |i| i + 1);
    let body = &lines[head_cut..];

    // The first credit line within the tail window marks where they end
    let tail_cut = (body.len().saturating_sub(HEAD_CUT_LIMIT)..body.len())
        .find(|&i| CREDIT_LINE_RE.is_match(body[i]))
        .unwrap_or(body.len());

    debug!(
        "Cleaned lyrics: {} timed lines, head cut at {}, tail cut at {}",
        lines.len(),
        head_cut,
        head_cut + tail_cut
    );

    CleanedLyrics::from_lines(body[..tail_cut].iter().map(|line| line.to_string()).collect())
}
