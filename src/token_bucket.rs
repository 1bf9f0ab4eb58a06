use std::time::{Duration, Instant};

/// A single client's token balance.
///
/// Refill is lazy: tokens accrue from the elapsed time observed on each
/// access, so an idle bucket costs nothing until it is touched again.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: u32,
    tokens: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket at `now`. `capacity` and `refill_rate` must be
    /// positive; the registry only builds buckets from validated configuration.
    pub fn new(capacity: u32, refill_rate: f64, now: Instant) -> Self {
        Self {
            capacity,
            tokens: capacity as f64,
            refill_rate,
            last_refill: now,
        }
    }

    /// Refills, then spends one token if a whole one is available.
    /// The refill is applied even when the request is rejected.
    pub fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Whole tokens available at `now`, without spending any.
    pub fn peek(&mut self, now: Instant) -> u32 {
        self.refill(now);
        self.tokens.floor() as u32
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Advances the refill clock to `now`. A `now` earlier than the last
    /// refill counts as zero elapsed time and never moves the clock back.
    pub fn refill(&mut self, now: Instant) {
        let elapsed = now
            .checked_duration_since(self.last_refill)
            .unwrap_or(Duration::ZERO);
        let tokens_to_add = self.refill_rate * elapsed.as_secs_f64();

        self.tokens = (self.tokens + tokens_to_add).min(self.capacity as f64);
        self.last_refill = self.last_refill.max(now);
    }
}
