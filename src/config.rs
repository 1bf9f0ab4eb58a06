use clap::Parser;
use std::net::SocketAddr;

use crate::error::GatewayError;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Parser, Clone)]
#[command(name = "gatekeeper", version, about = "Rate-limited API gateway")]
pub struct Config {
    /// Server bind address
    #[arg(long, env = "GATEKEEPER_BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind_addr: SocketAddr,

    /// Maximum tokens held by each client's bucket
    #[arg(long, env = "GATEKEEPER_CAPACITY", default_value_t = 100)]
    pub capacity: u32,

    /// Tokens added to each bucket per second
    #[arg(long, env = "GATEKEEPER_REFILL_RATE", default_value_t = 0.167)]
    pub refill_rate: f64,

    /// Key clients on X-Forwarded-For / X-Real-IP instead of the socket peer.
    /// Only safe behind a proxy that overwrites those headers.
    #[arg(long, env = "GATEKEEPER_TRUST_FORWARDED_HEADERS", default_value_t = false)]
    pub trust_forwarded_headers: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "GATEKEEPER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            capacity: 100,
            refill_rate: 0.167,
            trust_forwarded_headers: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from command-line flags and environment variables
    pub fn load() -> Result<Self, GatewayError> {
        let config = Config::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.capacity == 0 {
            return Err(GatewayError::Configuration(
                "Bucket capacity must be greater than 0".to_string(),
            ));
        }

        if !self.refill_rate.is_finite() || self.refill_rate <= 0.0 {
            return Err(GatewayError::Configuration(
                "Refill rate must be a positive number".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(GatewayError::Configuration(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}
