//! Service wiring
//!
//! - `ServiceFactory`: builds the cache store, provider client and resolver from `Config`
//! - `ResolverContext`: the shared handle the CLI resolves through

pub mod context;
pub mod factory;

pub use context::ResolverContext;
pub use factory::ServiceFactory;
