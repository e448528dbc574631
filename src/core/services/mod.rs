//! External provider integrations
//!
//! - `provider`: the provider trait, candidate types and stage outcomes
//! - `kugou`: HTTP implementation against the Kugou endpoints

pub mod kugou;
pub mod provider;

pub use kugou::KugouClient;
pub use provider::{
    LyricsCandidate, LyricsProvider, LyricsSearch, RawLyricsPayload, SongCandidate, StageOutcome,
};
