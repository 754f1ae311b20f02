//! Credential loading: property lookup, secret decoding, and the immutable
//! `Credential` handed to the token manager.

pub mod credential;
pub mod decoder;
pub mod property_source;
