// API request/response models (DTOs)

use serde::{Deserialize, Serialize};

/// Scheduler-facing response: `{ok:true,count}` on success,
/// `{ok:false,error}` on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefreshResponse {
    pub fn success(count: usize) -> Self {
        Self {
            ok: true,
            count: Some(count),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            count: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_shape_omits_error() {
        let value = serde_json::to_value(RefreshResponse::success(17)).unwrap();
        assert_eq!(value, serde_json::json!({"ok": true, "count": 17}));
    }

    #[test]
    fn failure_shape_omits_count() {
        let value = serde_json::to_value(RefreshResponse::failure("boom")).unwrap();
        assert_eq!(value, serde_json::json!({"ok": false, "error": "boom"}));
    }
}
