use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::backend::Backend;
use crate::error::GatewayError;
use crate::metrics::{MetricsCollector, RequestOutcome};
use crate::rate_limiter::RateLimiter;
use crate::response::{Envelope, FailureEnvelope, RateLimitEnvelope, SuccessEnvelope};

/// Final status and body for one gateway request.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl GatewayResponse {
    fn rate_limited() -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            envelope: Envelope::RateLimited(RateLimitEnvelope::default()),
        }
    }

    fn completed(client_ip: &str, data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: Envelope::Success(SuccessEnvelope::new(client_ip, data)),
        }
    }

    fn failed(err: &GatewayError) -> Self {
        Self {
            status: err.status_code(),
            envelope: Envelope::Failure(FailureEnvelope::processing(err.to_string())),
        }
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let retry_after = match &self.envelope {
            Envelope::RateLimited(body) => Some(body.retry_after_seconds),
            _ => None,
        };

        let mut resp = (self.status, Json(self.envelope)).into_response();
        if let Some(secs) = retry_after {
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        resp
    }
}

/// Admission, dispatch and metrics for every request routed through the gateway.
#[derive(Clone)]
pub struct GatewayPipeline {
    rate_limiter: RateLimiter,
    metrics: MetricsCollector,
    backend: Arc<dyn Backend>,
}

impl GatewayPipeline {
    pub fn new(
        rate_limiter: RateLimiter,
        metrics: MetricsCollector,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            rate_limiter,
            metrics,
            backend,
        }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Runs one request to a terminal outcome. Exactly one outcome is
    /// recorded per call, whichever path is taken.
    pub async fn handle(&self, client_ip: &str, endpoint: &str, payload: Value) -> GatewayResponse {
        let admitted = match self.rate_limiter.is_allowed(client_ip) {
            Ok(admitted) => admitted,
            Err(err) => {
                error!(client_ip, error = %err, "Admission check failed");
                self.metrics
                    .record(RequestOutcome::completed(Duration::ZERO))
                    .await;
                return GatewayResponse::failed(&err);
            }
        };

        if !admitted {
            warn!(client_ip, endpoint, "Rate limit exceeded");
            self.metrics.record(RequestOutcome::blocked()).await;
            return GatewayResponse::rate_limited();
        }

        debug!(client_ip, endpoint, "Request admitted");
        let start = Instant::now();
        let result = self.dispatch(endpoint, payload).await;
        let latency = start.elapsed();
        self.metrics.record(RequestOutcome::completed(latency)).await;

        match result {
            Ok(data) => GatewayResponse::completed(client_ip, data),
            Err(err) => {
                error!(client_ip, endpoint, error = %err, "Backend request failed");
                GatewayResponse::failed(&err)
            }
        }
    }

    // Runs on the blocking pool; no gateway lock is held across the call.
    async fn dispatch(&self, endpoint: &str, payload: Value) -> Result<Value, GatewayError> {
        let backend = Arc::clone(&self.backend);
        let endpoint = endpoint.to_string();

        tokio::task::spawn_blocking(move || backend.dispatch(&endpoint, &payload))
            .await
            .map_err(|e| GatewayError::Backend(format!("Backend task failed: {}", e)))?
            .map_err(GatewayError::from)
    }
}
