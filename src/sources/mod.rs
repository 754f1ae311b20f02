/// Token sources
///
/// A `TokenClient` performs one exchange against the token endpoint. The
/// manager decides when to call it and how to cache the result.
use std::future::Future;

use serde::Deserialize;

use crate::credentials::credential::Credential;
use crate::error::TokenError;

pub mod oauth2;

/// Server answer to a successful token request.
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// lifetime in seconds
    pub expires_in: u64,
}

impl TokenGrant {
    pub fn new(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
        }
    }
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

pub trait TokenClient: Send + Sync {
    /// One network exchange, no retries.
    fn request_token(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<TokenGrant, TokenError>> + Send;
}

impl<T: TokenClient> TokenClient for std::sync::Arc<T> {
    fn request_token(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<TokenGrant, TokenError>> + Send {
        (**self).request_token(credential)
    }
}
