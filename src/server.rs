use crate::backend::{Backend, BackendService};
use crate::config::Config;
use crate::handlers::{
    get_client_status, get_metrics, health_check, reset_metrics, root, search_products, AppState,
    SharedState,
};
use crate::health::HealthChecker;
use crate::metrics::MetricsCollector;
use crate::middleware::logging_middleware;
use crate::pipeline::GatewayPipeline;
use crate::rate_limiter::RateLimiter;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the router with the default catalog backend.
pub fn create_app(config: &Config) -> Router {
    create_app_with_backend(config, Arc::new(BackendService::new()))
}

pub fn create_app_with_backend(config: &Config, backend: Arc<dyn Backend>) -> Router {
    let rate_limiter = RateLimiter::new(config.capacity, config.refill_rate);
    let state: SharedState = Arc::new(AppState {
        health: HealthChecker::new(rate_limiter.clone()),
        pipeline: GatewayPipeline::new(rate_limiter, MetricsCollector::new(), backend),
        trust_forwarded_headers: config.trust_forwarded_headers,
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/products/search", get(search_products))
        .route("/metrics", get(get_metrics))
        .route("/reset-metrics", post(reset_metrics))
        .route("/client-status/:client_ip", get(get_client_status))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

pub struct Server {
    app: Router,
    bind_addr: SocketAddr,
}

impl Server {
    pub fn new(config: &Config) -> Self {
        Self {
            app: create_app(config),
            bind_addr: config.bind_addr,
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;

        tracing::info!("Gateway listening on {}", self.bind_addr);
        tracing::info!("Metrics available at /metrics");

        // Run server with graceful shutdown
        axum::serve(listener, self.app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
