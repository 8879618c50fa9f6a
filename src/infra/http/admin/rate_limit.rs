use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sliding-window limiter for login attempts, keyed by client.
#[derive(Debug, Clone)]
pub struct LoginRateLimiter {
    window: Duration,
    max_attempts: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
}

impl LoginRateLimiter {
    pub fn new(window: Duration, max_attempts: u32) -> Self {
        Self {
            window,
            max_attempts,
            buckets: Arc::new(DashMap::new()),
        }
    }

    /// Record an attempt; returns whether it is allowed and how many remain.
    pub fn allow(&self, key: &str) -> (bool, u32) {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> (bool, u32) {
        let window = self.window;

        let mut entry = self.buckets.entry(key.to_string()).or_default();
        entry.retain(|instant| now.saturating_duration_since(*instant) < window);

        let remaining = self.max_attempts.saturating_sub(entry.len() as u32);
        if remaining == 0 {
            return (false, 0);
        }

        entry.push(now);
        (true, remaining.saturating_sub(1))
    }

    /// Forget a client's attempts after it logs in.
    pub fn reset(&self, key: &str) {
        self.buckets.remove(key);
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }
}
