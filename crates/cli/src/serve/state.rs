//! Application state, the authenticated owner, and rate limiting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use sitelog_storage::DraftStorage;

use super::RATE_LIMIT_WINDOW_SECS;

/// The authenticated draft owner, resolved by the auth middleware from the
/// bearer token. Handlers read the owner only from this extension, never
/// from the request body or query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Owner(pub(crate) i64);

/// Fixed-window request counter for one owner.
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    started: Instant,
}

/// In-memory per-owner rate limiter.
pub(crate) struct RateLimiter {
    windows: Mutex<HashMap<i64, Window>>,
    /// Maximum requests per window.
    max_requests: u64,
}

impl RateLimiter {
    pub(crate) fn new(max_requests: u64) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
        }
    }

    /// Check if a request from the given owner is allowed.
    /// Returns Ok(()) if allowed, Err(retry_after_secs) if rate limited.
    pub(crate) async fn check(&self, owner_id: i64) -> Result<(), u64> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows.entry(owner_id).or_insert(Window {
            count: 0,
            started: now,
        });

        let elapsed = now.duration_since(window.started).as_secs();
        if elapsed >= RATE_LIMIT_WINDOW_SECS {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        if window.count > self.max_requests {
            Err(RATE_LIMIT_WINDOW_SECS.saturating_sub(elapsed))
        } else {
            Ok(())
        }
    }
}

/// Application state shared across request handlers.
pub(crate) struct AppState {
    /// The draft store backend (sqlite or in-memory).
    pub(crate) store: Arc<dyn DraftStorage>,
    /// Bearer-token registry: token -> owner id.
    pub(crate) tokens: HashMap<String, i64>,
    /// Per-owner rate limiter.
    pub(crate) rate_limiter: RateLimiter,
}
