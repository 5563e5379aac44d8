/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `account`: Registration, activation, login, profile, password reset
/// - `journal`: Daily entries
/// - `search`: Search, entry dates and streaks
///
/// Successful responses share one envelope:
///
/// ```json
/// { "success": true, "result": ..., "total": 3 }
/// ```
///
/// `result` and `total` are omitted when a route has nothing to return.

pub mod account;
pub mod health;
pub mod journal;
pub mod search;

use serde::Serialize;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            total: None,
        }
    }

    pub fn page(result: T, total: u64) -> Self {
        Self {
            success: true,
            result: Some(result),
            total: Some(total),
        }
    }
}

impl ApiResponse<()> {
    pub fn empty() -> Self {
        Self {
            success: true,
            result: None,
            total: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        assert_eq!(
            serde_json::to_value(ApiResponse::empty()).unwrap(),
            json!({ "success": true })
        );
        assert_eq!(
            serde_json::to_value(ApiResponse::page(vec![1, 2], 5)).unwrap(),
            json!({ "success": true, "result": [1, 2], "total": 5 })
        );
    }
}
