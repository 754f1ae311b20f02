//! Startup checks for the service config. Every problem is collected so a
//! broken file is reported in one go.

use std::collections::HashMap;

use tracing::{error, info};

use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::config::types::ServiceConfig;
use crate::credentials::property_source::{
    KEY_CLIENT_ID, KEY_CLIENT_SECRET, KEY_GRANT_TYPE, KEY_TOKEN_ENDPOINT,
};
use crate::utils::constants::{HEALTH_PATH, TOKEN_PATH};

const MAX_SAFETY_MARGIN_SECONDS: u64 = 60 * 60 * 24;
const MAX_RETRY_DELAY_MS: u64 = 5 * 60 * 1000;
const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    validate_credentials(&cfg.credentials, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(retry) = &settings.retry {
        validate_retry("settings.retry", retry, errors);
    }

    if let Some(s) = settings.safety_margin_seconds {
        if s > MAX_SAFETY_MARGIN_SECONDS {
            errors.push(format!(
                "settings.safety_margin_seconds ({}) is unreasonably large",
                s
            ));
        }
    }

    if let Err(e) = settings.lifetime_override() {
        errors.push(format!("settings.token_lifetime_override_seconds: {}", e));
    }

    if settings.http_timeout_ms == Some(0) {
        errors.push("settings.http_timeout_ms must be > 0".to_string());
    }

    if settings.server.host.is_empty() {
        errors.push(format!(
            "settings.server.host '{}' must be valid",
            settings.server.host
        ));
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }
    if [TOKEN_PATH, HEALTH_PATH].contains(&metrics.path.as_str()) {
        errors.push(format!(
            "settings.metrics.path '{}' collides with a built-in route",
            metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_retry(path: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if let Some(attempts) = retry.max_attempts {
        if attempts > MAX_RETRY_ATTEMPTS {
            errors.push(format!(
                "{}.max_attempts ({}) must be <= {}",
                path, attempts, MAX_RETRY_ATTEMPTS
            ));
        }
    }
    if let Some(delay) = retry.delay_ms {
        if delay > MAX_RETRY_DELAY_MS {
            errors.push(format!(
                "{}.delay_ms ({}) must be <= {}",
                path, delay, MAX_RETRY_DELAY_MS
            ));
        }
    }
}

/// Presence only: blank values may come from unset env vars and are rejected
/// when a token is first requested.
fn validate_credentials(credentials: &HashMap<String, String>, errors: &mut Vec<String>) {
    for key in [KEY_CLIENT_ID, KEY_CLIENT_SECRET, KEY_GRANT_TYPE, KEY_TOKEN_ENDPOINT] {
        if !credentials.contains_key(key) {
            errors.push(format!("credentials.{} is required", key));
        }
    }

    if let Some(endpoint) = credentials.get(KEY_TOKEN_ENDPOINT).map(|e| e.trim()) {
        if !endpoint.is_empty() && !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(format!(
                "credentials.{} '{}' must be an http(s) URL",
                KEY_TOKEN_ENDPOINT, endpoint
            ));
        }
    }
}
