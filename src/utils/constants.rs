//! Shared defaults and built-in routes

pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 30;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: &str = "8085";

// Built-in routes
pub const TOKEN_PATH: &str = "/token";
pub const HEALTH_PATH: &str = "/health";
