pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod token_bucket;
pub mod validation;

pub use config::Config;
pub use error::{GatewayError, Result};
pub use pipeline::{GatewayPipeline, GatewayResponse};
pub use server::create_app;
