//! # Token Keeper Library
//!
//! Caches an OAuth2 client-credentials access token for API test runs and
//! refreshes it at most once per expiry window, however many callers ask.
//!
//! Modules:
//! - `manager` - single-flight token manager, the entry point
//! - `cache` - single-slot token cache and validity checks
//! - `credentials` - property lookup and secret decoding
//! - `sources` - token endpoint client
//! - `resilience` - 429-aware retry governor
//! - `config` - YAML service configuration

pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod manager;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::error::TokenError;
pub use crate::manager::token_manager::TokenManager;
pub use crate::resilience::retry::{should_retry, Decision, RetryPolicy, RetryState};
