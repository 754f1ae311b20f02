use std::time::Duration;

use serde::Deserialize;

use crate::credentials::decoder::SecretEncoding;
use crate::error::TokenError;
use crate::resilience::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::utils::constants::{
    DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_SAFETY_MARGIN_SECS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    pub safety_margin_seconds: Option<u64>,
    /// overrides the server-declared `expires_in`; empty means "not set"
    pub token_lifetime_override_seconds: Option<LifetimeOverride>,
    pub http_timeout_ms: Option<u64>,
    #[serde(default)]
    pub secret_encoding: SecretEncoding,
    #[serde(default)]
    pub decode_client_id: bool,
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
}

impl SettingsConfig {
    pub fn safety_margin(&self) -> Duration {
        Duration::from_secs(self.safety_margin_seconds.unwrap_or(DEFAULT_SAFETY_MARGIN_SECS))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = self.retry.as_ref();
        RetryPolicy::new(
            retry.and_then(|r| r.max_attempts).unwrap_or(DEFAULT_MAX_ATTEMPTS),
            retry
                .and_then(|r| r.delay_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_DELAY),
        )
    }

    pub fn lifetime_override(&self) -> Result<Option<u64>, TokenError> {
        match &self.token_lifetime_override_seconds {
            None => Ok(None),
            Some(LifetimeOverride::Seconds(seconds)) => Ok(Some(*seconds)),
            Some(LifetimeOverride::Text(text)) => parse_lifetime_override(Some(text)),
        }
    }
}

/// Integer or string in YAML; strings come from `${VAR}` expansion.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum LifetimeOverride {
    Seconds(u64),
    Text(String),
}

/// Absent and blank values both mean "use the server lifetime".
pub fn parse_lifetime_override(raw: Option<&str>) -> Result<Option<u64>, TokenError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<u64>().map(Some).map_err(|_| {
            TokenError::configuration(format!(
                "token lifetime override '{value}' is not a whole number of seconds"
            ))
        }),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// retries after the first attempt, only on 429
    pub max_attempts: Option<u32>,
    /// fixed wait before each retry
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_owned(),
            port: DEFAULT_SERVER_PORT.to_owned(),
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
