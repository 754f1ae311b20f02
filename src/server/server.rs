use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use serde_json::json;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::settings::SettingsConfig;
use crate::error::TokenError;
use crate::manager::token_manager::TokenManager;
use crate::observability::metrics::Metrics;
use crate::observability::routes::MetricsState;
use crate::sources::TokenClient;
use crate::utils::constants::{HEALTH_PATH, TOKEN_PATH};

pub struct AppState<C> {
    pub manager: Arc<TokenManager<C>>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
        }
    }
}

impl<C> AppState<C> {
    pub fn new(manager: Arc<TokenManager<C>>) -> Self {
        Self { manager }
    }
}

/// `/token` and `/health`, plus the metrics route when enabled.
pub fn router<C>(state: AppState<C>, settings: &SettingsConfig, metrics: Option<&Metrics>) -> Router
where
    C: TokenClient + 'static,
{
    let mut router = Router::new()
        .route(TOKEN_PATH, get(handle_token::<C>))
        .route(HEALTH_PATH, get(|| async { StatusCode::OK }));

    if let Some(metrics) = metrics {
        router = router.merge(MetricsState::new(metrics.registry.clone()).router(&settings.metrics));
    }
    router.with_state(state)
}

/// Serve until ctrl-c.
pub async fn start<C>(settings: &SettingsConfig, state: AppState<C>, metrics: Option<&Metrics>) -> Result<()>
where
    C: TokenClient + 'static,
{
    let app = router(state, settings, metrics);

    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow!("cannot bind {}: {}", bind_addr, e))?;
    info!("serving tokens on http://{}{}", bind_addr, TOKEN_PATH);

    if let Some(metrics) = metrics {
        metrics.up.set(1);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

async fn handle_token<C>(State(state): State<AppState<C>>) -> Response
where
    C: TokenClient + 'static,
{
    match state.manager.acquire().await {
        Ok(token) => Json(json!({
            "access_token": token.value(),
            "token_type": "Bearer",
            "expires_in": token.remaining_seconds(Instant::now()),
            "expires_at": token.expires_at_utc.to_rfc3339(),
        }))
        .into_response(),
        Err(err) => {
            warn!("token request failed: {}", err);
            let status = match &err {
                TokenError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                TokenError::Acquisition { .. } => StatusCode::BAD_GATEWAY,
                TokenError::RateLimited { .. } => StatusCode::SERVICE_UNAVAILABLE,
            };
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}
