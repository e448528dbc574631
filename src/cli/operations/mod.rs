//! Operations over many queries
//!
//! - `batch`: resolve a JSON or CSV list of queries concurrently

pub mod batch;

pub use batch::*;
