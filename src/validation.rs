use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::GatewayError;

/// Query string accepted by the catalog search route.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ProductSearchQuery {
    #[validate(length(min = 1, message = "category cannot be empty"))]
    pub category: String,

    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl ProductSearchQuery {
    /// Checks field bounds and returns the payload forwarded to the backend.
    pub fn into_payload(self) -> Result<Value, GatewayError> {
        self.validate()
            .map_err(|e| GatewayError::Validation(e.to_string()))?;

        Ok(json!({
            "category": self.category,
            "page": self.page,
            "limit": self.limit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn query(category: &str, page: u32, limit: u32) -> ProductSearchQuery {
        ProductSearchQuery {
            category: category.to_string(),
            page,
            limit,
        }
    }

    #[test]
    fn test_defaults_from_query_string() {
        let parsed: ProductSearchQuery =
            serde_json::from_value(json!({"category": "books"})).unwrap();
        assert_eq!(parsed.page, 1);
        assert_eq!(parsed.limit, 20);
    }

    #[test]
    fn test_valid_query_becomes_payload() {
        let payload = assert_ok!(query("electronics", 2, 10).into_payload());
        assert_eq!(payload, json!({"category": "electronics", "page": 2, "limit": 10}));
    }

    #[test]
    fn test_bounds_are_enforced() {
        assert_err!(query("electronics", 0, 10).into_payload());
        assert_err!(query("electronics", 1, 0).into_payload());
        assert_err!(query("electronics", 1, 51).into_payload());
        assert_err!(query("", 1, 10).into_payload());
    }

    #[test]
    fn test_validation_error_maps_to_422_variant() {
        let err = query("electronics", 1, 99).into_payload().unwrap_err();
        assert!(matches!(err, GatewayError::Validation(msg) if msg.contains("limit")));
    }
}
