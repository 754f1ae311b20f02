use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::cache::token::Token;

/// Single-slot token cache.
///
/// Readers never wait on an in-flight refresh: the slot is a watch channel, so
/// `read` clones the current `Arc<Token>` and `replace` swaps it in one step.
#[derive(Debug)]
pub struct TokenCache {
    slot: watch::Sender<Option<Arc<Token>>>,
    safety_margin: Duration,
}

impl TokenCache {
    pub fn new(safety_margin: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot,
            safety_margin,
        }
    }

    pub fn safety_margin(&self) -> Duration {
        self.safety_margin
    }

    /// True iff a token is present and `now + safety_margin < expires_at`.
    pub fn is_valid(&self, now: Instant) -> bool {
        self.slot
            .borrow()
            .as_ref()
            .is_some_and(|token| token.is_usable_at(now, self.safety_margin))
    }

    /// Current token, usable or not.
    pub fn read(&self) -> Option<Arc<Token>> {
        self.slot.borrow().clone()
    }

    /// Current token if it passes the validity check at `now`.
    pub fn read_valid(&self, now: Instant) -> Option<Arc<Token>> {
        self.read()
            .filter(|token| token.is_usable_at(now, self.safety_margin))
    }

    /// Install `token`, dropping whatever was cached before.
    pub fn replace(&self, token: Token) -> Arc<Token> {
        let token = Arc::new(token);
        self.slot.send_replace(Some(token.clone()));
        token
    }

    /// Receiver that wakes on every `replace`.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Token>>> {
        self.slot.subscribe()
    }
}
