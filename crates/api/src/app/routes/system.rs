use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

/// Liveness probe. Not enveloped; monitoring reads it raw.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "database": "connected",
        "timestamp": Utc::now(),
    }))
}
