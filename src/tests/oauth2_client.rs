// Token endpoint exchange over real HTTP against an axum mock:
//  - form fields sent as the client-credentials grant expects
//  - non-200 and malformed answers are hard failures for that attempt
//  - 429 answers go through the retry governor before surfacing

#[cfg(test)]
mod test {

use std::collections::HashMap;
use std::sync::{atomic::{AtomicUsize, Ordering}, Arc, Mutex};
use std::time::Duration;

use axum::{routing::post, Form, Json, Router};
use http::StatusCode;
use serde_json::json;

use crate::error::TokenError;
use crate::manager::token_manager::TokenManager;
use crate::resilience::retry::RetryPolicy;
use crate::sources::oauth2::HttpTokenClient;
use crate::sources::TokenClient;
use crate::tests::common::{build_reqwest_client, spawn_axum, test_credential};

#[tokio::test]
async fn posts_form_encoded_credentials() {
    let seen: Arc<Mutex<Option<HashMap<String, String>>>> = Arc::new(Mutex::new(None));
    let seen_clone = seen.clone();
    let router = Router::new().route("/oauth2/token", post(move |Form(form): Form<HashMap<String, String>>| {
        let seen = seen_clone.clone();
        async move {
            *seen.lock().unwrap() = Some(form);
            Json(json!({"type": "amadeusOAuth2Token", "access_token": "abc123", "expires_in": 1799}))
        }
    }));
    let (handle, addr) = spawn_axum(router).await;

    let client = HttpTokenClient::new(build_reqwest_client());
    let grant = client
        .request_token(&test_credential(&format!("http://{}/oauth2/token", addr)))
        .await
        .expect("token grant");

    assert_eq!(grant.access_token, "abc123");
    assert_eq!(grant.expires_in, 1799);

    let form = seen.lock().unwrap().clone().expect("request reached the server");
    assert_eq!(form.get("client_id").map(String::as_str), Some("test-client"));
    assert_eq!(form.get("client_secret").map(String::as_str), Some("test-secret"));
    assert_eq!(form.get("grant_type").map(String::as_str), Some("client_credentials"));

    handle.abort();
}

#[tokio::test]
async fn non_200_is_acquisition_error_with_status() {
    let router = Router::new().route("/token", post(|| async {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"})))
    }));
    let (handle, addr) = spawn_axum(router).await;

    let client = HttpTokenClient::new(build_reqwest_client());
    let err = client
        .request_token(&test_credential(&format!("http://{}/token", addr)))
        .await
        .unwrap_err();

    assert!(matches!(err, TokenError::Acquisition { status: Some(401), .. }), "{err:?}");
    handle.abort();
}

#[tokio::test]
async fn malformed_body_is_acquisition_error() {
    let router = Router::new().route("/token", post(|| async {
        Json(json!({"token": "missing expected fields"}))
    }));
    let (handle, addr) = spawn_axum(router).await;

    let client = HttpTokenClient::new(build_reqwest_client());
    let err = client
        .request_token(&test_credential(&format!("http://{}/token", addr)))
        .await
        .unwrap_err();

    assert!(matches!(err, TokenError::Acquisition { status: Some(200), .. }), "{err:?}");
    handle.abort();
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    // bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpTokenClient::with_timeout(Duration::from_secs(2)).unwrap();
    let err = client
        .request_token(&test_credential(&format!("http://{}/token", addr)))
        .await
        .unwrap_err();

    assert_eq!(err.status(), None);
    assert_eq!(err.reason(), "transport");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn manager_retries_throttled_endpoint() {
    // token endpoint throttles the first 2 requests then succeeds
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();
    let router = Router::new().route("/token", post(move || {
        let c = counter_clone.clone();
        async move {
            let n = c.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                (StatusCode::TOO_MANY_REQUESTS, Json(json!({"error": "slow down"})))
            } else {
                (StatusCode::OK, Json(json!({"access_token": format!("issued-{n}"), "expires_in": 3600})))
            }
        }
    }));
    let (handle, addr) = spawn_axum(router).await;

    let manager = TokenManager::new(
        test_credential(&format!("http://{}/token", addr)),
        HttpTokenClient::new(build_reqwest_client()),
    )
    .with_retry_policy(Some(RetryPolicy::new(2, Duration::from_millis(20))));

    assert_eq!(manager.get_token().await.unwrap(), "issued-2");
    assert_eq!(counter.load(Ordering::SeqCst), 3, "server should have seen exactly 3 attempts");

    // cached from here on
    assert_eq!(manager.get_token().await.unwrap(), "issued-2");
    assert_eq!(counter.load(Ordering::SeqCst), 3);

    handle.abort();
}

}
