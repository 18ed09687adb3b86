//! Token bucket primitive

use std::time::{Duration, Instant};

/// Token bucket for one tool
///
/// Tokens are floating point and refill continuously with wall-clock time,
/// capped at capacity. The bucket is a plain struct: the owning limiter
/// serializes all access behind its lock, so refill-then-consume is atomic
/// with respect to concurrent callers.
#[derive(Debug)]
pub struct TokenBucket {
    /// Maximum tokens (burst size)
    capacity: f64,
    /// Current tokens available
    tokens: f64,
    /// Refill rate in tokens per second
    refill_rate: f64,
    /// Last refill time
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    /// Refill tokens based on elapsed time
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Try to consume `n` tokens
    ///
    /// On success tokens decrease by exactly `n`; on failure the bucket is
    /// unchanged apart from the refill.
    pub fn try_consume(&mut self, n: f64) -> bool {
        self.refill();
        if self.tokens >= n {
            self.tokens -= n;
            true
        } else {
            false
        }
    }

    /// Time until `n` tokens will be available
    pub fn wait_time(&mut self, n: f64) -> Duration {
        self.refill();
        if self.tokens >= n {
            return Duration::ZERO;
        }
        if self.refill_rate <= 0.0 {
            return Duration::MAX;
        }
        Duration::from_secs_f64((n - self.tokens) / self.refill_rate)
    }

    /// Current tokens after a refill
    pub fn available(&mut self) -> f64 {
        self.refill();
        self.tokens
    }

    /// Bucket capacity
    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}
