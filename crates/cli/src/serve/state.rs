//! Application state, rate limiting and the session store.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use leadbook_engine::LeadService;
use leadbook_storage::MemoryStorage;
use tokio::sync::{Mutex, RwLock};

use super::auth::Credentials;
use super::{RATE_LIMIT_WINDOW, SESSION_TTL};

/// Per-IP request tracker: (request count, window start time).
type IpTracker = HashMap<IpAddr, (u64, Instant)>;

/// In-memory per-IP rate limiter with a fixed window.
pub(crate) struct RateLimiter {
    tracker: Mutex<IpTracker>,
    /// Maximum requests per window.
    pub(crate) max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub(crate) fn new(max_requests: u64) -> Self {
        Self::with_window(max_requests, RATE_LIMIT_WINDOW)
    }

    pub(crate) fn with_window(max_requests: u64, window: Duration) -> Self {
        Self {
            tracker: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Returns Ok(()) if allowed, Err(retry_after_secs) if rate limited.
    pub(crate) async fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let mut tracker = self.tracker.lock().await;
        let now = Instant::now();
        let window = self.window;

        // Forget clients whose window has long expired.
        if tracker.len() > 1024 {
            tracker.retain(|_, (_, start)| now.duration_since(*start) < window);
        }

        let entry = tracker.entry(ip).or_insert((0, now));
        let elapsed = now.duration_since(entry.1);
        if elapsed >= window {
            *entry = (0, now);
        }

        entry.0 += 1;
        if entry.0 > self.max_requests {
            let retry_after = window.saturating_sub(now.duration_since(entry.1));
            Err(retry_after.as_secs().max(1))
        } else {
            Ok(())
        }
    }
}

/// Opaque session tokens issued by `POST /login`, each valid for `ttl`
/// after issue. Memory only; a restart logs everyone out.
pub(crate) struct SessionStore {
    tokens: RwLock<HashMap<String, Instant>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub(crate) fn with_ttl(ttl: Duration) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Record a fresh token. Expired tokens are dropped on every insert, so
    /// the store only holds sessions issued within the last `ttl`.
    pub(crate) async fn insert(&self, token: String) {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, issued| now.duration_since(*issued) < ttl);
        tokens.insert(token, now);
    }

    pub(crate) async fn contains(&self, token: &str) -> bool {
        self.tokens
            .read()
            .await
            .get(token)
            .is_some_and(|issued| issued.elapsed() < self.ttl)
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

/// Application state shared across request handlers.
pub(crate) struct AppState {
    pub(crate) service: LeadService<MemoryStorage>,
    pub(crate) rate_limiter: RateLimiter,
    pub(crate) sessions: SessionStore,
    /// Admin credentials from the environment. None = every login fails.
    pub(crate) credentials: Option<Credentials>,
    /// Default rows per page for `GET /leads`.
    pub(crate) page_size: usize,
}
