use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, error};

use crate::credentials::credential::Credential;
use crate::error::TokenError;
use crate::sources::{TokenClient, TokenGrant};

/// Client-credentials exchange over HTTP: form-encoded POST, JSON answer.
#[derive(Debug, Clone)]
pub struct HttpTokenClient {
    client: Client,
}

impl HttpTokenClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TokenError> {
        Client::builder()
            .timeout(timeout)
            .build()
            .map(Self::new)
            .map_err(|e| TokenError::configuration(format!("failed to build HTTP client: {e}")))
    }
}

impl TokenClient for HttpTokenClient {
    async fn request_token(&self, credential: &Credential) -> Result<TokenGrant, TokenError> {
        debug!("requesting token from {}", credential.token_endpoint);
        let response = self
            .client
            .post(&credential.token_endpoint)
            .form(&credential.form())
            .send()
            .await
            .map_err(|e| TokenError::acquisition(None, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(
                "token generation failed. Status: {}, Response: {}",
                status.as_u16(),
                body
            );
            return Err(TokenError::acquisition(
                Some(status.as_u16()),
                format!("token endpoint answered {status}"),
            ));
        }

        response
            .json::<TokenGrant>()
            .await
            .map_err(|e| TokenError::acquisition(Some(status.as_u16()), format!("invalid token response: {e}")))
    }
}
