use std::collections::HashMap;

use serde::Deserialize;

use crate::config::settings::SettingsConfig;
use crate::credentials::property_source::ConfigProperties;

/// ================================
/// Full service configuration
/// ================================
#[derive(Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    /// client_id, client_secret, grant_type, token_endpoint
    #[serde(default)]
    pub credentials: HashMap<String, String>,
}

impl ServiceConfig {
    pub fn properties(&self) -> ConfigProperties {
        ConfigProperties::new(self.credentials.clone())
    }
}

// credential values stay out of logs
impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("settings", &self.settings)
            .field("credentials", &self.properties())
            .finish()
    }
}
