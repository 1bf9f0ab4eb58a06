use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::error::GatewayError;
use crate::token_bucket::TokenBucket;

type SharedBucket = Arc<Mutex<TokenBucket>>;

/// Per-client view of the limiter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStats {
    pub tokens_remaining: u32,
    pub capacity: u32,
    pub refill_rate: f64,
}

/// Owns one token bucket per client identifier.
///
/// The map lock only guards lookup-or-create; each bucket carries its own
/// mutex so unrelated clients never contend on a consume.
#[derive(Clone)]
pub struct RateLimiter {
    capacity: u32,
    refill_rate: f64,
    buckets: Arc<RwLock<HashMap<String, SharedBucket>>>,
}

impl RateLimiter {
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        RateLimiter {
            capacity,
            refill_rate,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// Admission check against the current time.
    pub fn is_allowed(&self, client_id: &str) -> Result<bool, GatewayError> {
        self.admit(client_id, Instant::now())
    }

    /// Spends one token from `client_id`'s bucket, creating a full bucket
    /// the first time the client is seen.
    pub fn admit(&self, client_id: &str, now: Instant) -> Result<bool, GatewayError> {
        let bucket = self.bucket_for(client_id, now)?;
        let mut bucket = bucket
            .lock()
            .map_err(|_| GatewayError::Internal("Failed to acquire bucket lock".to_string()))?;

        Ok(bucket.try_consume(now))
    }

    /// Stats for `client_id` at the current time.
    pub fn client_stats(&self, client_id: &str) -> Result<ClientStats, GatewayError> {
        self.stats(client_id, Instant::now())
    }

    /// Read-only probe. Unknown clients report a full bucket and no entry
    /// is created for them.
    pub fn stats(&self, client_id: &str, now: Instant) -> Result<ClientStats, GatewayError> {
        let bucket = {
            let buckets = self.buckets.read().map_err(|_| {
                GatewayError::Internal("Failed to acquire read lock on buckets".to_string())
            })?;
            buckets.get(client_id).cloned()
        };

        let tokens_remaining = match bucket {
            Some(bucket) => {
                let mut bucket = bucket.lock().map_err(|_| {
                    GatewayError::Internal("Failed to acquire bucket lock".to_string())
                })?;
                bucket.peek(now)
            }
            None => self.capacity,
        };

        Ok(ClientStats {
            tokens_remaining,
            capacity: self.capacity,
            refill_rate: self.refill_rate,
        })
    }

    /// Number of clients that currently own a bucket.
    pub fn tracked_clients(&self) -> Result<usize, GatewayError> {
        let buckets = self.buckets.read().map_err(|_| {
            GatewayError::Internal("Failed to acquire read lock on buckets".to_string())
        })?;
        Ok(buckets.len())
    }

    fn bucket_for(&self, client_id: &str, now: Instant) -> Result<SharedBucket, GatewayError> {
        {
            let buckets = self.buckets.read().map_err(|_| {
                GatewayError::Internal("Failed to acquire read lock on buckets".to_string())
            })?;
            if let Some(bucket) = buckets.get(client_id) {
                return Ok(Arc::clone(bucket));
            }
        }

        // Re-checked under the write lock: two first requests from the same
        // client must end up sharing one bucket.
        let mut buckets = self.buckets.write().map_err(|_| {
            GatewayError::Internal("Failed to acquire write lock on buckets".to_string())
        })?;
        let bucket = buckets.entry(client_id.to_string()).or_insert_with(|| {
            debug!(client_id, capacity = self.capacity, "Creating token bucket");
            Arc::new(Mutex::new(TokenBucket::new(self.capacity, self.refill_rate, now)))
        });

        Ok(Arc::clone(bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_client_gets_full_bucket() {
        let limiter = RateLimiter::new(3, 1.0);
        let now = Instant::now();

        assert!(limiter.admit("10.0.0.1", now).unwrap());
        assert_eq!(limiter.stats("10.0.0.1", now).unwrap().tokens_remaining, 2);
    }

    #[test]
    fn test_per_client_independence() {
        let limiter = RateLimiter::new(5, 0.5);
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.admit("client-a", now).unwrap());
        }
        assert!(!limiter.admit("client-a", now).unwrap());

        assert!(limiter.admit("client-b", now).unwrap());
        assert_eq!(limiter.stats("client-b", now).unwrap().tokens_remaining, 4);
    }

    #[test]
    fn test_unknown_client_stats_do_not_create_bucket() {
        let limiter = RateLimiter::new(4, 2.0);
        let now = Instant::now();

        let stats = limiter.stats("never-seen", now).unwrap();
        assert_eq!(
            stats,
            ClientStats {
                tokens_remaining: 4,
                capacity: 4,
                refill_rate: 2.0,
            }
        );
        assert_eq!(limiter.tracked_clients().unwrap(), 0);

        for _ in 0..4 {
            assert!(limiter.admit("never-seen", now).unwrap());
        }
        assert!(!limiter.admit("never-seen", now).unwrap());
        assert_eq!(limiter.tracked_clients().unwrap(), 1);
    }

    #[test]
    fn test_refill_after_exhaustion() {
        let limiter = RateLimiter::new(2, 10.0);
        let start = Instant::now();

        assert!(limiter.admit("c", start).unwrap());
        assert!(limiter.admit("c", start).unwrap());
        assert!(!limiter.admit("c", start).unwrap());

        assert!(limiter.admit("c", start + Duration::from_millis(150)).unwrap());
    }

    #[test]
    fn test_concurrent_first_requests_share_one_bucket() {
        let limiter = RateLimiter::new(50, 0.001);
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.admit("burst", now).unwrap())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
        assert_eq!(limiter.tracked_clients().unwrap(), 1);
    }
}
