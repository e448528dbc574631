//! Lyrics resolution for the Kugou provider: query normalization, candidate
//! disambiguation, content cleaning and fail-open memoization of provider calls.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
