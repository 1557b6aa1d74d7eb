//! Fixed-window request limit per client address.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use tracing::warn;

use dokku_core::DokkuError;

use crate::{AppState, DokkuAxumError};

#[derive(Debug, Clone)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    hits: Arc<Mutex<HashMap<String, (Instant, u32)>>>,
}

impl RateLimiter {
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one request for `client`; false once the window is full.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock();

        // Prune expired windows once the map gets large.
        if hits.len() > 10_000 {
            let window = self.window;
            hits.retain(|_, (start, _)| now.duration_since(*start) < window);
        }

        let entry = hits.entry(client.to_string()).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }
        if entry.1 >= self.limit {
            return false;
        }
        entry.1 += 1;
        true
    }
}

/// `ConnectInfo` when served with it, else the first `x-forwarded-for` hop.
pub fn client_key(connect: Option<SocketAddr>, headers: &HeaderMap) -> String {
    if let Some(addr) = connect {
        return addr.ip().to_string();
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let connect = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(connect, req.headers());

    if !state.limiter.check(&client) {
        warn!(%client, "rate limit exceeded");
        let err = DokkuError::too_many_requests(format!(
            "Rate limit exceeded: {} per 1 minute",
            state.limiter.limit()
        ));
        return DokkuAxumError::from(err).into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_fills_then_resets() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("1.2.3.4", start));
        assert!(limiter.check_at("1.2.3.4", start));
        assert!(!limiter.check_at("1.2.3.4", start + Duration::from_secs(30)));
        assert!(limiter.check_at("5.6.7.8", start));

        assert!(limiter.check_at("1.2.3.4", start + Duration::from_secs(61)));
    }

    #[test]
    fn client_key_prefers_connect_info() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());

        let addr: SocketAddr = "192.168.1.5:5555".parse().unwrap();
        assert_eq!(client_key(Some(addr), &headers), "192.168.1.5");
        assert_eq!(client_key(None, &headers), "10.0.0.1");
        assert_eq!(client_key(None, &HeaderMap::new()), "unknown");
    }
}
