// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;

use crate::credentials::credential::Credential;
use crate::error::TokenError;
use crate::sources::{TokenClient, TokenGrant};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn test_credential(token_endpoint: &str) -> Credential {
    Credential::new(
        "test-client",
        SecretString::from("test-secret"),
        "client_credentials",
        token_endpoint,
    )
}

/// In-process token endpoint.
///
/// Plays back scripted outcomes first, then issues `token-<n>` grants where
/// `n` is the 1-based call number.
pub struct MockTokenClient {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Result<TokenGrant, TokenError>>>,
    expires_in: u64,
    delay: Duration,
}

impl MockTokenClient {
    pub fn new(expires_in: u64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(VecDeque::new()),
            expires_in,
            delay: Duration::ZERO,
        }
    }

    /// Time each exchange takes; widens the window for concurrent callers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn then(self, outcome: Result<TokenGrant, TokenError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn then_status(self, status: u16) -> Self {
        self.then(Err(TokenError::acquisition(Some(status), format!("status {status}"))))
    }

    pub fn push_status(&self, status: u16) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(TokenError::acquisition(Some(status), format!("status {status}"))));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenClient for MockTokenClient {
    async fn request_token(&self, _credential: &Credential) -> Result<TokenGrant, TokenError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(TokenGrant::new(format!("token-{call}"), self.expires_in)))
    }
}
