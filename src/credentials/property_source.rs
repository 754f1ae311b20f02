use std::collections::HashMap;

use crate::error::TokenError;

pub const KEY_CLIENT_ID: &str = "client_id";
pub const KEY_CLIENT_SECRET: &str = "client_secret";
pub const KEY_GRANT_TYPE: &str = "grant_type";
pub const KEY_TOKEN_ENDPOINT: &str = "token_endpoint";

/// Synchronous property lookup. A missing key is a configuration error.
pub trait PropertySource {
    fn get(&self, key: &str) -> Result<String, TokenError>;
}

/// Properties read from the `credentials` block of the service config.
#[derive(Clone, Default)]
pub struct ConfigProperties {
    values: HashMap<String, String>,
}

impl ConfigProperties {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl PropertySource for ConfigProperties {
    fn get(&self, key: &str) -> Result<String, TokenError> {
        self.values
            .get(key)
            .map(|value| value.trim().to_owned())
            .ok_or_else(|| TokenError::configuration(format!("property '{key}' is not set")))
    }
}

// values may hold encoded secrets
impl std::fmt::Debug for ConfigProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("ConfigProperties").field("keys", &keys).finish()
    }
}
