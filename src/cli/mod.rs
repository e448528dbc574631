//! Command Line Interface module
//!
//! - `core`: resolving a single query
//! - `operations`: batch resolution
//! - `management`: configuration and cache

pub mod core;
pub mod management;
pub mod operations;
