pub mod common;

mod expiration_and_cache;
mod oauth2_client;
