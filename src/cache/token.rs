use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::time::Instant;

// same cap tokio uses for "never"
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Cached access token with its expiry.
///
/// Replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: SecretString,
    pub expires_at: Instant,
    /// wall clock view of `expires_at`, for logs and responses
    pub expires_at_utc: DateTime<Utc>,
}

impl Token {
    pub fn new(access_token: SecretString, expires_at: Instant, expires_at_utc: DateTime<Utc>) -> Self {
        Self {
            access_token,
            expires_at,
            expires_at_utc,
        }
    }

    /// Build a token that expires `lifetime_seconds` after `now`.
    pub fn issued_at(access_token: SecretString, now: Instant, lifetime_seconds: u64) -> Self {
        let lifetime = Duration::from_secs(lifetime_seconds);
        let expires_at = now
            .checked_add(lifetime)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let expires_at_utc = chrono::Duration::from_std(lifetime)
            .ok()
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(access_token, expires_at, expires_at_utc)
    }

    pub fn value(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Usable iff `now + safety_margin < expires_at`.
    pub fn is_usable_at(&self, now: Instant, safety_margin: Duration) -> bool {
        now.checked_add(safety_margin)
            .is_some_and(|deadline| deadline < self.expires_at)
    }

    /// Whole seconds left before the real expiry, zero once expired.
    pub fn remaining_seconds(&self, now: Instant) -> u64 {
        self.expires_at.saturating_duration_since(now).as_secs()
    }
}
