use thiserror::Error;

/// Errors surfaced by credential loading and token acquisition.
///
/// `Clone` so a failed refresh can be handed to every caller that waited on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Missing or empty credential property, or a secret that decoded to nothing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport failure, non-200 response, or undecodable token response.
    #[error("token acquisition failed{}: {message}", status_suffix(.status))]
    Acquisition {
        status: Option<u16>,
        message: String,
    },

    /// The token endpoint kept answering 429 until the retry cap was reached.
    #[error("token endpoint rate limited the request after {attempts} attempts")]
    RateLimited { attempts: u32 },
}

impl TokenError {
    pub fn configuration(message: impl Into<String>) -> Self {
        TokenError::Configuration(message.into())
    }

    pub fn acquisition(status: Option<u16>, message: impl Into<String>) -> Self {
        TokenError::Acquisition {
            status,
            message: message.into(),
        }
    }

    /// HTTP status that caused the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TokenError::Acquisition { status, .. } => *status,
            TokenError::RateLimited { .. } => Some(429),
            TokenError::Configuration(_) => None,
        }
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Configuration(_) => "configuration",
            TokenError::Acquisition { status: None, .. } => "transport",
            TokenError::Acquisition { .. } => "status",
            TokenError::RateLimited { .. } => "rate_limited",
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}
