use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::response::FailureEnvelope;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Backend(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Backend(_)
            | GatewayError::Configuration(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BackendError> for GatewayError {
    fn from(err: BackendError) -> Self {
        GatewayError::Backend(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            GatewayError::Validation(msg) => {
                (status, Json(FailureEnvelope::new("Invalid request", msg))).into_response()
            }
            other => (status, Json(FailureEnvelope::processing(other.to_string()))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::Validation("limit".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            GatewayError::Backend("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_backend_error_keeps_message() {
        let err: GatewayError = BackendError::UnknownEndpoint("/nope".into()).into();
        assert_eq!(err.to_string(), "Endpoint /nope not found");
    }

    #[test]
    fn test_validation_response_status() {
        let resp = GatewayError::Validation("page must be at least 1".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
