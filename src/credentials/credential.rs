use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::credentials::decoder::SecretDecoder;
use crate::credentials::property_source::{
    PropertySource, KEY_CLIENT_ID, KEY_CLIENT_SECRET, KEY_GRANT_TYPE, KEY_TOKEN_ENDPOINT,
};
use crate::error::TokenError;

/// Client-credentials grant inputs. Immutable after load.
///
/// `client_secret` is redacted from `Debug` and never serialized.
#[derive(Debug, Clone)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: SecretString,
    pub grant_type: String,
    pub token_endpoint: String,
}

impl Credential {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        grant_type: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            grant_type: grant_type.into(),
            token_endpoint: token_endpoint.into(),
        }
    }

    /// Read every credential property and decode the secret.
    ///
    /// Absent properties fail here. Empty values, including a secret that
    /// decoded to nothing, are accepted and rejected by `validate` on first use.
    pub fn load(
        properties: &dyn PropertySource,
        decoder: &dyn SecretDecoder,
        key: &str,
        decode_client_id: bool,
    ) -> Result<Self, TokenError> {
        let raw_client_id = properties.get(KEY_CLIENT_ID)?;
        let client_id = if decode_client_id {
            decoder.decrypt(&raw_client_id, key)
        } else {
            raw_client_id
        };
        let client_secret = decoder.decrypt(&properties.get(KEY_CLIENT_SECRET)?, key);
        if client_secret.is_empty() {
            warn!("client secret is empty after decoding");
        }

        Ok(Self::new(
            client_id,
            SecretString::from(client_secret),
            properties.get(KEY_GRANT_TYPE)?,
            properties.get(KEY_TOKEN_ENDPOINT)?,
        ))
    }

    /// Every field must be non-empty before a token request is made.
    pub fn validate(&self) -> Result<(), TokenError> {
        let missing: Vec<&str> = [
            (KEY_CLIENT_ID, self.client_id.trim().is_empty()),
            (KEY_CLIENT_SECRET, self.client_secret.expose_secret().is_empty()),
            (KEY_GRANT_TYPE, self.grant_type.trim().is_empty()),
            (KEY_TOKEN_ENDPOINT, self.token_endpoint.trim().is_empty()),
        ]
        .into_iter()
        .filter_map(|(key, empty)| empty.then_some(key))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TokenError::configuration(format!(
                "client credentials not properly configured, empty: {}",
                missing.join(", ")
            )))
        }
    }

    /// Form body of the token request.
    pub fn form(&self) -> [(&'static str, &str); 3] {
        [
            (KEY_CLIENT_ID, self.client_id.as_str()),
            (KEY_CLIENT_SECRET, self.client_secret.expose_secret()),
            (KEY_GRANT_TYPE, self.grant_type.as_str()),
        ]
    }
}
