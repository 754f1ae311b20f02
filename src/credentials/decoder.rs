use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::error;

/// `decrypt(ciphertext, key) -> plaintext` seam.
///
/// Implementations never fail outward: on error they log and return an empty
/// string, which the credential layer rejects as a configuration error.
pub trait SecretDecoder: Send + Sync {
    fn decrypt(&self, cipher_text: &str, key: &str) -> String;
}

/// Secret stored as-is; the key is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl SecretDecoder for Plain {
    fn decrypt(&self, cipher_text: &str, _key: &str) -> String {
        cipher_text.to_owned()
    }
}

/// Secret stored base64-encoded, as in Kubernetes secret manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64;

impl SecretDecoder for Base64 {
    fn decrypt(&self, cipher_text: &str, _key: &str) -> String {
        STANDARD
            .decode(cipher_text.trim())
            .map_err(|err| err.to_string())
            .and_then(|bytes| String::from_utf8(bytes).map_err(|err| err.to_string()))
            .unwrap_or_else(|err| {
                error!("error occurred while decoding secret: {}", err);
                String::new()
            })
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretEncoding {
    #[default]
    Plain,
    Base64,
}

impl SecretEncoding {
    pub fn decoder(&self) -> Box<dyn SecretDecoder> {
        match self {
            SecretEncoding::Plain => Box::new(Plain),
            SecretEncoding::Base64 => Box::new(Base64),
        }
    }
}
