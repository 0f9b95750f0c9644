//! Per-client request rate limiting.
//!
//! Each client (keyed by IP) gets a sliding window of request instants. A
//! request is admitted while fewer than `limit` requests fall inside the
//! window. Idle clients are dropped once the table grows past
//! [`PRUNE_THRESHOLD`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use spartan_core::error::CoreError;

use super::client::client_ip;
use crate::error::AppError;
use crate::state::AppState;

/// Length of the counting window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Client count above which stale entries are swept on the next check.
const PRUNE_THRESHOLD: usize = 1024;

/// Paths that are never limited.
const EXEMPT_PATHS: &[&str] = &["/api/health"];

/// Sliding-window limiter shared through [`AppState`].
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    clients: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// `limit` requests per minute per client; `0` admits everything.
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit as usize, WINDOW)
    }

    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limit > 0
    }

    /// Record a request from `key` and report whether it is admitted.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if clients.len() > PRUNE_THRESHOLD {
            let window = self.window;
            clients.retain(|_, hits| {
                hits.back()
                    .is_some_and(|last| now.saturating_duration_since(*last) < window)
            });
        }

        let hits = clients.entry(key.to_string()).or_default();
        while hits
            .front()
            .is_some_and(|first| now.saturating_duration_since(*first) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.limit {
            return false;
        }
        hits.push_back(now);
        true
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Middleware rejecting over-limit clients with 429.
pub async fn enforce(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();
    if EXEMPT_PATHS.contains(&path) || !state.rate_limiter.is_enabled() {
        return Ok(next.run(request).await);
    }

    let key = client_ip(request.headers(), request.extensions())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.rate_limiter.check(&key) {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return Err(AppError::Core(CoreError::TooManyRequests(
            "Rate limit exceeded, try again later".into(),
        )));
    }

    Ok(next.run(request).await)
}
