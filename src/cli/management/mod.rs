//! Management commands: configuration and cache

pub mod cache;
pub mod config;
