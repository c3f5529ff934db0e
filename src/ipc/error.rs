use serde_json::json;
use tracing::error;

use crate::error::AppError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Error response for an `AppError`; internal failures are logged with their
/// full cause chain.
pub fn app_err(id: &str, method: &str, e: AppError) -> serde_json::Value {
    if let AppError::Internal(inner) = &e {
        error!(%id, %method, "request failed: {inner:#}");
    }
    err(id, e.code(), e.to_string(), None)
}
