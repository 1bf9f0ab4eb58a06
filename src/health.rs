use std::time::SystemTime;
use serde::Serialize;

use crate::rate_limiter::RateLimiter;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub tracked_clients: usize,
}

#[derive(Clone)]
pub struct HealthChecker {
    rate_limiter: RateLimiter,
    started: SystemTime,
}

impl HealthChecker {
    pub fn new(rate_limiter: RateLimiter) -> Self {
        Self {
            rate_limiter,
            started: SystemTime::now(),
        }
    }

    pub fn check_health(&self) -> HealthStatus {
        let uptime = SystemTime::now()
            .duration_since(self.started)
            .unwrap_or_default()
            .as_secs();

        // A poisoned registry still answers health checks, just degraded.
        let (status, tracked_clients) = match self.rate_limiter.tracked_clients() {
            Ok(count) => ("healthy", count),
            Err(_) => ("degraded", 0),
        };

        HealthStatus {
            status: status.to_string(),
            service: "api-gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
            tracked_clients,
        }
    }
}
