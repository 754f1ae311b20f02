use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

/// Prometheus collectors for the token manager.
///
/// Built once at startup and shared as `Arc<Metrics>`.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Refresh metrics
    pub token_refresh_requests: IntCounter,
    pub token_refresh_attempts: IntCounterVec,
    pub token_refresh_failures: IntCounterVec,
    pub token_refresh_duration: HistogramVec,

    // Cache metrics
    pub cache_hits: IntCounter,
    pub token_expiry_unix: IntGauge,

    // Runtime
    pub up: IntGauge,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("tokenkeeper".into()), None)?;

        let metrics = Self {
            // Refresh
            token_refresh_requests: IntCounter::new("token_refresh_requests_total", "Refreshes started after a cache miss")?,
            token_refresh_attempts: IntCounterVec::new(Opts::new("token_refresh_attempts_total", "Token endpoint calls by outcome status"), &["status"])?,
            token_refresh_failures: IntCounterVec::new(Opts::new("token_refresh_failures_total", "Failed refreshes by reason"), &["reason"])?,
            token_refresh_duration: HistogramVec::new(HistogramOpts::new("token_refresh_duration_seconds", "Refresh duration seconds, retries included").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]), &["outcome"])?,

            // Cache
            cache_hits: IntCounter::new("token_cache_hits_total", "Requests served from the cache")?,
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the cached token")?,

            // Runtime
            up: IntGauge::new("up", "1 if service is healthy")?,

            registry,
        };

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_refresh_requests.clone()))?;
        reg.register(Box::new(metrics.token_refresh_attempts.clone()))?;
        reg.register(Box::new(metrics.token_refresh_failures.clone()))?;
        reg.register(Box::new(metrics.token_refresh_duration.clone()))?;
        reg.register(Box::new(metrics.cache_hits.clone()))?;
        reg.register(Box::new(metrics.token_expiry_unix.clone()))?;
        reg.register(Box::new(metrics.up.clone()))?;

        Ok(metrics)
    }
}
