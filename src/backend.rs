//! Backend collaborator behind the gateway.
//!
//! Endpoints are a registration table of plain functions sharing one
//! contract: a JSON payload in, a JSON result or a [`BackendError`] out.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

pub const PRODUCT_SEARCH_ENDPOINT: &str = "/products/search";
pub const HEALTH_ENDPOINT: &str = "/health";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("Endpoint {0} not found")]
    UnknownEndpoint(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Anything the gateway can forward admitted requests to.
pub trait Backend: Send + Sync {
    fn dispatch(&self, endpoint: &str, payload: &Value) -> Result<Value, BackendError>;
}

pub type Handler = Arc<dyn Fn(&Value) -> Result<Value, BackendError> + Send + Sync>;

/// Routes each endpoint to its registered handler.
#[derive(Clone)]
pub struct BackendService {
    handlers: HashMap<String, Handler>,
}

impl Default for BackendService {
    fn default() -> Self {
        let mut service = Self::empty();
        service.register_handler(PRODUCT_SEARCH_ENDPOINT, search_products);
        service.register_handler(HEALTH_ENDPOINT, health);
        service
    }
}

impl BackendService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Adds or replaces the handler for `endpoint`.
    pub fn register_handler<F>(&mut self, endpoint: &str, handler: F)
    where
        F: Fn(&Value) -> Result<Value, BackendError> + Send + Sync + 'static,
    {
        self.handlers.insert(endpoint.to_string(), Arc::new(handler));
    }
}

impl Backend for BackendService {
    fn dispatch(&self, endpoint: &str, payload: &Value) -> Result<Value, BackendError> {
        let handler = self
            .handlers
            .get(endpoint)
            .ok_or_else(|| BackendError::UnknownEndpoint(endpoint.to_string()))?;
        handler(payload)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: u32,
    pub name: &'static str,
    pub price: f64,
    pub in_stock: bool,
}

const fn product(id: u32, name: &'static str, price: f64, in_stock: bool) -> Product {
    Product {
        id,
        name,
        price,
        in_stock,
    }
}

const ELECTRONICS: &[Product] = &[
    product(1, "Laptop", 999.99, true),
    product(2, "USB Cable", 9.99, true),
    product(3, "Monitor", 299.99, false),
    product(4, "Keyboard", 79.99, true),
    product(5, "Mouse", 29.99, true),
];

const CLOTHING: &[Product] = &[
    product(101, "T-Shirt", 19.99, true),
    product(102, "Jeans", 49.99, true),
    product(103, "Jacket", 99.99, false),
    product(104, "Sneakers", 89.99, true),
];

const BOOKS: &[Product] = &[
    product(201, "Python Guide", 39.99, true),
    product(202, "System Design", 49.99, true),
    product(203, "Web Dev 101", 29.99, false),
];

const HOME: &[Product] = &[
    product(301, "Pillow", 24.99, true),
    product(302, "Blanket", 59.99, true),
    product(303, "Desk Lamp", 44.99, true),
];

const CATALOG: &[(&str, &[Product])] = &[
    ("electronics", ELECTRONICS),
    ("clothing", CLOTHING),
    ("books", BOOKS),
    ("home", HOME),
];

fn positive_field(payload: &Value, field: &str, default: u64) -> Result<u64, BackendError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                BackendError::InvalidPayload(format!("'{}' must be a positive integer", field))
            }),
    }
}

/// Paged catalog lookup. An unknown category is an answer, not a fault.
pub fn search_products(payload: &Value) -> Result<Value, BackendError> {
    let category = match payload.get("category") {
        None | Some(Value::Null) => "electronics".to_string(),
        Some(Value::String(c)) => c.to_lowercase(),
        Some(_) => {
            return Err(BackendError::InvalidPayload(
                "'category' must be a string".to_string(),
            ))
        }
    };
    let page = positive_field(payload, "page", 1)?;
    let limit = positive_field(payload, "limit", 20)?;

    let Some((_, products)) = CATALOG.iter().find(|(name, _)| *name == category) else {
        let available: Vec<&str> = CATALOG.iter().map(|(name, _)| *name).collect();
        return Ok(json!({
            "status": "error",
            "message": format!("Category '{}' not found. Available: {:?}", category, available),
        }));
    };

    let total_results = products.len() as u64;
    let start = (page - 1).saturating_mul(limit).min(total_results) as usize;
    let end = start.saturating_add(limit as usize).min(products.len());

    Ok(json!({
        "status": "success",
        "data": {
            "category": category,
            "page": page,
            "limit": limit,
            "total_results": total_results,
            "total_pages": total_results.div_ceil(limit),
            "results": &products[start..end],
        }
    }))
}

pub fn health(_payload: &Value) -> Result<Value, BackendError> {
    Ok(json!({
        "status": "healthy",
        "service": "e-commerce-api-gateway",
        "uptime_seconds": 3600,
        "version": env!("CARGO_PKG_VERSION"),
        "protected_by": "rate-limiter",
    }))
}
