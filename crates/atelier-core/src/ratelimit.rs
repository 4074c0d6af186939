//! Per-client request limiting.
//!
//! Handlers depend on the [`RateLimiter`] trait only. [`SlidingWindowLimiter`]
//! keeps its counters in process memory: they do not survive a restart and
//! are not shared between instances.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::RateLimitConfig;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request may proceed; `remaining` more fit in the current window
    Allowed { remaining: u32 },
    /// The request must be rejected until `retry_after` has passed
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Trait that all rate limiter implementations share.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record a request from `client` and decide whether it may proceed.
    async fn check(&self, client: &str) -> RateDecision;
}

/// Allows every request.
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn check(&self, _client: &str) -> RateDecision {
        RateDecision::Allowed {
            remaining: u32::MAX,
        }
    }
}

/// Sliding-window counter keyed by client identifier.
pub struct SlidingWindowLimiter {
    max_requests: u32,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Check against an explicit clock reading.
    pub fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut hits = self.hits.lock();

        // Forget clients whose window has fully elapsed.
        hits.retain(|_, times| {
            times
                .back()
                .is_some_and(|last| now.saturating_duration_since(*last) < self.window)
        });

        let times = hits.entry(client.to_string()).or_default();
        while times
            .front()
            .is_some_and(|first| now.saturating_duration_since(*first) >= self.window)
        {
            times.pop_front();
        }

        if times.len() as u32 >= self.max_requests {
            let oldest = times.front().copied().unwrap_or(now);
            let retry_after = self
                .window
                .saturating_sub(now.saturating_duration_since(oldest));
            return RateDecision::Limited { retry_after };
        }

        times.push_back(now);
        RateDecision::Allowed {
            remaining: self.max_requests - times.len() as u32,
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.hits.lock().len()
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }
}
