use serde::Serialize;
use serde_json::Value;

use crate::rate_limiter::ClientStats;

/// Body of a 429 response. Every field is fixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitEnvelope {
    pub success: bool,
    pub message: String,
    pub error: String,
    pub retry_after_seconds: u64,
}

impl Default for RateLimitEnvelope {
    fn default() -> Self {
        Self {
            success: false,
            message: "Rate limit exceeded".to_string(),
            error: "Too many requests".to_string(),
            retry_after_seconds: 1,
        }
    }
}

/// Body of an admitted request that the backend answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessEnvelope {
    pub success: bool,
    pub message: String,
    pub data: Value,
    pub received_from_ip: String,
}

impl SuccessEnvelope {
    pub fn new(client_ip: &str, data: Value) -> Self {
        Self {
            success: true,
            message: format!("Request received from {}", client_ip),
            data,
            received_from_ip: client_ip.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureEnvelope {
    pub success: bool,
    pub message: String,
    pub error: String,
}

impl FailureEnvelope {
    pub fn new(message: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            error: error.into(),
        }
    }

    pub fn processing(error: impl Into<String>) -> Self {
        Self::new("Error processing request", error)
    }
}

/// Any of the three bodies the pipeline can produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(SuccessEnvelope),
    RateLimited(RateLimitEnvelope),
    Failure(FailureEnvelope),
}

#[derive(Debug, Serialize)]
pub struct GatewayInfo {
    pub service: String,
    pub version: String,
    pub documentation: String,
    pub available_endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub route: &'static str,
    pub description: &'static str,
}

impl GatewayInfo {
    pub fn current() -> Self {
        Self {
            service: "Rate-Limited API Gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            documentation: "/".to_string(),
            available_endpoints: vec![
                EndpointInfo {
                    route: "GET /products/search",
                    description: "Search the product catalog (rate limited)",
                },
                EndpointInfo {
                    route: "GET /metrics",
                    description: "View gateway metrics",
                },
                EndpointInfo {
                    route: "POST /reset-metrics",
                    description: "Reset gateway metrics",
                },
                EndpointInfo {
                    route: "GET /client-status/:client_ip",
                    description: "Rate limit status for a client",
                },
                EndpointInfo {
                    route: "GET /health",
                    description: "Health check",
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn metrics_reset() -> Self {
        Self {
            message: "Metrics have been reset".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientStatusResponse {
    pub client_ip: String,
    pub rate_limit_status: ClientStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rate_limit_envelope_shape() {
        let body = serde_json::to_value(RateLimitEnvelope::default()).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Rate limit exceeded",
                "error": "Too many requests",
                "retry_after_seconds": 1
            })
        );
    }

    #[test]
    fn test_success_envelope_embeds_client() {
        let envelope = SuccessEnvelope::new("10.0.0.7", json!({"status": "success"}));
        assert_eq!(envelope.message, "Request received from 10.0.0.7");

        let body = serde_json::to_value(Envelope::Success(envelope)).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["received_from_ip"], "10.0.0.7");
        assert_eq!(body["data"]["status"], "success");
    }

    #[test]
    fn test_failure_envelope_shape() {
        let body = serde_json::to_value(FailureEnvelope::processing("backend down")).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Error processing request",
                "error": "backend down"
            })
        );
    }
}
