//! Core CLI commands
//!
//! - `resolve`: resolve one title/artist/duration query to lyrics

pub mod resolve;

pub use resolve::*;
