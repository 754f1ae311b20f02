//! Token manager: serves a valid access token to any number of concurrent
//! callers while keeping token endpoint calls to one per expiry window.
//!
//! # Refresh protocol
//!
//! 1. Serve from the cache while `now + safety_margin < expires_at` (no lock).
//! 2. Otherwise take the refresh lock and check the cache again: a caller that
//!    waited on the lock usually finds the token its predecessor installed.
//! 3. A caller that waited on a refresh that failed gets that refresh's error
//!    instead of starting another one.
//! 4. Only then call the token endpoint (through the retry governor when a
//!    policy is set) and install the result.
//!
//! A failed refresh never touches the cache; a stale token stays readable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cache::token::Token;
use crate::cache::token_cache::TokenCache;
use crate::credentials::credential::Credential;
use crate::error::TokenError;
use crate::observability::metrics::Metrics;
use crate::resilience::retry::{RetryPolicy, STATUS_TOO_MANY_REQUESTS};
use crate::sources::{TokenClient, TokenGrant};

/// Refresh 30 seconds before expiry so a token never lapses mid-request.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(30);

static OUTCOME_SUCCESS: &str = "success";
static OUTCOME_FAILURE: &str = "failure";
static STATUS_TRANSPORT: &str = "transport";

/// Guarded by the refresh lock.
#[derive(Debug, Default)]
struct RefreshState {
    /// completed refresh attempts, successful or not
    epoch: u64,
    last_error: Option<TokenError>,
}

pub struct TokenManager<C> {
    credential: Credential,
    /// `Credential` is immutable, so it is checked once on first use
    credential_check: OnceLock<Result<(), TokenError>>,
    client: C,
    cache: TokenCache,
    lifetime_override: Option<u64>,
    retry: Option<RetryPolicy>,
    refresh: Mutex<RefreshState>,
    /// mirror of `RefreshState::epoch`, readable without the lock
    epoch: AtomicU64,
    metrics: Option<Arc<Metrics>>,
}

impl<C> std::fmt::Debug for TokenManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credential", &self.credential)
            .field("cache", &self.cache)
            .field("lifetime_override", &self.lifetime_override)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<C: TokenClient> TokenManager<C> {
    pub fn new(credential: Credential, client: C) -> Self {
        Self {
            credential,
            credential_check: OnceLock::new(),
            client,
            cache: TokenCache::new(DEFAULT_SAFETY_MARGIN),
            lifetime_override: None,
            retry: Some(RetryPolicy::default()),
            refresh: Mutex::new(RefreshState::default()),
            epoch: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_safety_margin(mut self, safety_margin: Duration) -> Self {
        self.cache = TokenCache::new(safety_margin);
        self
    }

    /// Fixed token lifetime in seconds, taking precedence over `expires_in`.
    pub fn with_lifetime_override(mut self, lifetime_seconds: Option<u64>) -> Self {
        self.lifetime_override = lifetime_seconds;
        self
    }

    /// Governor policy for throttled refreshes; `None` disables retries.
    pub fn with_retry_policy(mut self, retry: Option<RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Current access token, refreshed first if missing or near expiry.
    pub async fn get_token(&self) -> Result<String, TokenError> {
        self.acquire().await.map(|token| token.value().to_owned())
    }

    /// Like `get_token`, but hands back the whole cached token.
    pub async fn acquire(&self) -> Result<Arc<Token>, TokenError> {
        self.check_credential()?;

        if let Some(token) = self.cache.read_valid(Instant::now()) {
            self.record_cache_hit();
            return Ok(token);
        }

        let observed_epoch = self.epoch.load(Ordering::Acquire);
        let mut state = self.refresh.lock().await;

        if let Some(token) = self.cache.read_valid(Instant::now()) {
            debug!("token was refreshed while waiting for the refresh lock");
            self.record_cache_hit();
            return Ok(token);
        }

        if state.epoch != observed_epoch {
            if let Some(err) = &state.last_error {
                debug!("refresh finished while waiting and failed: {}", err);
                return Err(err.clone());
            }
        }

        self.refresh(&mut state).await
    }

    /// Refresh even if the cached token is still usable, e.g. after the API
    /// rejected it. Single-flight like `acquire`: a caller that waited on
    /// another refresh takes that refresh's outcome. On failure the cached
    /// token stays in place.
    pub async fn force_refresh(&self) -> Result<Arc<Token>, TokenError> {
        self.check_credential()?;

        let observed_epoch = self.epoch.load(Ordering::Acquire);
        let mut state = self.refresh.lock().await;

        if state.epoch != observed_epoch {
            match (&state.last_error, self.cache.read()) {
                (Some(err), _) => return Err(err.clone()),
                (None, Some(token)) => return Ok(token),
                (None, None) => {}
            }
        }

        self.refresh(&mut state).await
    }

    fn check_credential(&self) -> Result<(), TokenError> {
        self.credential_check
            .get_or_init(|| self.credential.validate())
            .clone()
    }

    /// Caller must hold the refresh lock, which `state` proves.
    async fn refresh(&self, state: &mut RefreshState) -> Result<Arc<Token>, TokenError> {
        info!("generating new access token...");
        if let Some(metrics) = &self.metrics {
            metrics.token_refresh_requests.inc();
        }
        let start = Instant::now();

        let outcome = self.request_with_retry().await;

        state.epoch += 1;
        self.epoch.store(state.epoch, Ordering::Release);

        match outcome {
            Ok(grant) => {
                let lifetime = self.lifetime_override.unwrap_or(grant.expires_in);
                let token = Token::issued_at(
                    SecretString::from(grant.access_token),
                    Instant::now(),
                    lifetime,
                );
                if !token.is_usable_at(Instant::now(), self.cache.safety_margin()) {
                    warn!(
                        "token lifetime {}s does not exceed the {}s safety margin; every call will refresh",
                        lifetime,
                        self.cache.safety_margin().as_secs()
                    );
                }

                state.last_error = None;
                let token = self.cache.replace(token);
                info!("token generated successfully, expires at: {}", token.expires_at_utc);

                if let Some(metrics) = &self.metrics {
                    metrics.token_expiry_unix.set(token.expires_at_utc.timestamp());
                    metrics.token_refresh_duration.with_label_values(&[OUTCOME_SUCCESS]).observe(start.elapsed().as_secs_f64());
                }
                Ok(token)
            }
            Err(err) => {
                error!("error generating token: {}", err);
                state.last_error = Some(err.clone());

                if let Some(metrics) = &self.metrics {
                    metrics.token_refresh_failures.with_label_values(&[err.reason()]).inc();
                    metrics.token_refresh_duration.with_label_values(&[OUTCOME_FAILURE]).observe(start.elapsed().as_secs_f64());
                }
                Err(err)
            }
        }
    }

    async fn request_with_retry(&self) -> Result<TokenGrant, TokenError> {
        let attempt = move || async move {
            let result = self.client.request_token(&self.credential).await;
            self.record_attempt(&result);
            result
        };

        let Some(policy) = &self.retry else {
            return attempt().await;
        };

        match policy.run_with_retry(attempt).await {
            Err(err) if err.status() == Some(STATUS_TOO_MANY_REQUESTS) => Err(TokenError::RateLimited {
                attempts: policy.max_attempts.saturating_add(1),
            }),
            other => other,
        }
    }

    fn record_attempt(&self, result: &Result<TokenGrant, TokenError>) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let status = match result {
            Ok(_) => "200".to_owned(),
            Err(err) => err
                .status()
                .map(|status| status.to_string())
                .unwrap_or_else(|| STATUS_TRANSPORT.to_owned()),
        };
        metrics.token_refresh_attempts.with_label_values(&[status.as_str()]).inc();
    }

    fn record_cache_hit(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.cache_hits.inc();
        }
    }
}
