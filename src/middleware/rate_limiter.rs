//! Per-client rate limiting

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{collections::HashMap, sync::Arc, time::Instant};
use tokio::sync::RwLock;

use super::client_ip;
use crate::error::ApiError;

/// Token bucket for rate limiting
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(max_tokens: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_update: Instant::now(),
        }
    }

    fn try_consume(&mut self, tokens_per_second: f64, max_tokens: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * tokens_per_second).min(max_tokens);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Rate limiter shared across requests; one bucket per client
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<RwLock<HashMap<String, TokenBucket>>>,
    tokens_per_second: f64,
    max_tokens: f64,
}

impl RateLimiter {
    /// Create a new rate limiter allowing bursts of twice the steady rate
    pub fn new(requests_per_second: u32) -> Self {
        let rps = f64::from(requests_per_second.max(1));
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            tokens_per_second: rps,
            max_tokens: rps * 2.0,
        }
    }

    /// Check if a request is allowed
    pub async fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.write().await;

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.max_tokens));

        bucket.try_consume(self.tokens_per_second, self.max_tokens)
    }

    /// Drop buckets idle for longer than `max_age`
    pub async fn cleanup(&self, max_age: std::time::Duration) -> usize {
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();
        let before = buckets.len();

        buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
        before - buckets.len()
    }
}

/// Middleware rejecting clients that exceed their budget with 429
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request).unwrap_or_else(|| "unknown".to_string());

    if !limiter.check(&client).await {
        tracing::warn!(client = %client, "Rate limit exceeded");
        let mut response = ApiError::TooManyRequests.into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        return response;
    }

    next.run(request).await
}
