use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

/// What happened to one request, as reported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestOutcome {
    pub was_blocked: bool,
    pub latency: Duration,
}

impl RequestOutcome {
    pub fn blocked() -> Self {
        Self {
            was_blocked: true,
            latency: Duration::ZERO,
        }
    }

    pub fn completed(latency: Duration) -> Self {
        Self {
            was_blocked: false,
            latency,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RawMetrics {
    total_requests: u64,
    successful_requests: u64,
    blocked_requests: u64,
    response_times: Vec<f64>,
}

/// Derived, externally reported view of the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub blocked_requests: u64,
    pub average_response_time_seconds: f64,
    pub success_rate_percent: f64,
    pub block_rate_percent: f64,
}

/// Gateway-wide request counters.
///
/// Counters and samples live behind one lock so `total == successful + blocked`
/// holds for every reader, and a reset never interleaves with a record.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    raw: Arc<RwLock<RawMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocked requests count toward the total but contribute no latency sample.
    pub async fn record(&self, outcome: RequestOutcome) {
        let mut raw = self.raw.write().await;

        raw.total_requests += 1;
        if outcome.was_blocked {
            raw.blocked_requests += 1;
        } else {
            raw.successful_requests += 1;
            raw.response_times.push(outcome.latency.as_secs_f64());
        }
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let raw = self.raw.read().await;

        MetricsSnapshot {
            total_requests: raw.total_requests,
            successful_requests: raw.successful_requests,
            blocked_requests: raw.blocked_requests,
            average_response_time_seconds: round_to(
                average_response_time(&raw.response_times),
                4,
            ),
            success_rate_percent: round_to(
                success_rate(raw.total_requests, raw.successful_requests),
                2,
            ),
            block_rate_percent: round_to(block_rate(raw.total_requests, raw.blocked_requests), 2),
        }
    }

    #[cfg(test)]
    pub(crate) async fn sample_count(&self) -> usize {
        self.raw.read().await.response_times.len()
    }

    pub async fn reset(&self) {
        let mut raw = self.raw.write().await;
        *raw = RawMetrics::default();
    }
}

/// Mean of the samples, 0 when there are none.
pub fn average_response_time(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

pub fn success_rate(total: u64, successful: u64) -> f64 {
    percentage(successful, total)
}

pub fn block_rate(total: u64, blocked: u64) -> f64 {
    percentage(blocked, total)
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_derivation() {
        assert_eq!(success_rate(100, 75), 75.0);
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(block_rate(100, 25), 25.0);
        assert_eq!(block_rate(0, 0), 0.0);
        assert_eq!(success_rate(4, 4), 100.0);
    }

    #[test]
    fn test_average_response_time() {
        assert_eq!(average_response_time(&[]), 0.0);
        assert!((average_response_time(&[0.1, 0.2, 0.3]) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(16.666_666, 2), 16.67);
        assert_eq!(round_to(0.123_456, 4), 0.1235);
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let metrics = MetricsCollector::new();
        let snapshot = metrics.snapshot().await;

        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.average_response_time_seconds, 0.0);
        assert_eq!(snapshot.success_rate_percent, 0.0);
        assert_eq!(snapshot.block_rate_percent, 0.0);
    }

    #[tokio::test]
    async fn test_blocked_requests_have_no_latency_sample() {
        let metrics = MetricsCollector::new();
        metrics.record(RequestOutcome::completed(Duration::from_millis(100))).await;
        metrics.record(RequestOutcome::blocked()).await;
        metrics.record(RequestOutcome::completed(Duration::from_millis(300))).await;

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.successful_requests, 2);
        assert_eq!(snapshot.blocked_requests, 1);
        assert_eq!(snapshot.average_response_time_seconds, 0.2);
        assert_eq!(snapshot.success_rate_percent, 66.67);
        assert_eq!(snapshot.block_rate_percent, 33.33);
        assert_eq!(metrics.sample_count().await, 2);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let metrics = MetricsCollector::new();
        metrics.record(RequestOutcome::blocked()).await;
        metrics.record(RequestOutcome::completed(Duration::from_millis(5))).await;

        metrics.reset().await;
        let once = metrics.snapshot().await;
        metrics.reset().await;
        let twice = metrics.snapshot().await;

        assert_eq!(once, twice);
        assert_eq!(once.total_requests, 0);
        assert_eq!(metrics.sample_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_stay_consistent() {
        let metrics = MetricsCollector::new();

        let tasks: Vec<_> = (0..200)
            .map(|i| {
                let metrics = metrics.clone();
                tokio::spawn(async move {
                    let outcome = if i % 4 == 0 {
                        RequestOutcome::blocked()
                    } else {
                        RequestOutcome::completed(Duration::from_millis(1))
                    };
                    metrics.record(outcome).await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.total_requests, 200);
        assert_eq!(snapshot.blocked_requests, 50);
        assert_eq!(snapshot.successful_requests, 150);
        assert_eq!(
            snapshot.total_requests,
            snapshot.successful_requests + snapshot.blocked_requests
        );
        assert_eq!(metrics.sample_count().await, 150);
    }
}
