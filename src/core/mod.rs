//! Core functionality modules
//!
//! - `services`: provider trait and the Kugou HTTP client
//! - `infrastructure`: cache stores and the memoization layer
//! - `lyrics`: title, artist and content normalization
//! - `resolver`: candidate search and disambiguation

pub mod infrastructure;
pub mod lyrics;
pub mod resolver;
pub mod services;

pub use lyrics::CleanedLyrics;
pub use resolver::{LyricsResolver, Query, Resolution, ResolverSettings};
