use axum::{
    extract::{rejection::QueryRejection, ConnectInfo, Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::backend::PRODUCT_SEARCH_ENDPOINT;
use crate::error::{GatewayError, Result};
use crate::health::HealthChecker;
use crate::middleware::rate_limit_key;
use crate::pipeline::GatewayPipeline;
use crate::response::{ClientStatusResponse, GatewayInfo, MessageResponse};
use crate::validation::ProductSearchQuery;

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Application state containing the gateway pipeline and health checker
pub struct AppState {
    pub pipeline: GatewayPipeline,
    pub health: HealthChecker,
    pub trust_forwarded_headers: bool,
}

/// Gateway info endpoint
pub async fn root() -> impl IntoResponse {
    Json(GatewayInfo::current())
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.health.check_health())
}

/// Search the product catalog through the rate-limited pipeline
pub async fn search_products(
    State(state): State<SharedState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    query: std::result::Result<Query<ProductSearchQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query.map_err(|e| GatewayError::Validation(e.body_text()))?;
    let payload = query.into_payload()?;

    let peer = peer.map(|ConnectInfo(addr)| addr);
    let client_ip = rate_limit_key(&headers, peer, state.trust_forwarded_headers);

    Ok(state
        .pipeline
        .handle(&client_ip, PRODUCT_SEARCH_ENDPOINT, payload)
        .await)
}

/// Current gateway metrics
pub async fn get_metrics(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.pipeline.metrics().snapshot().await)
}

/// Reset gateway metrics to zero
pub async fn reset_metrics(State(state): State<SharedState>) -> impl IntoResponse {
    state.pipeline.metrics().reset().await;
    info!("Metrics have been reset");

    Json(MessageResponse::metrics_reset())
}

/// Rate limit status for a client
pub async fn get_client_status(
    State(state): State<SharedState>,
    Path(client_ip): Path<String>,
) -> Result<impl IntoResponse> {
    let stats = state.pipeline.rate_limiter().client_stats(&client_ip)?;

    Ok(Json(ClientStatusResponse {
        client_ip,
        rate_limit_status: stats,
    }))
}
