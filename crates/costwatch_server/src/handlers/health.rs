use axum::Json;

/// GET /health — liveness probe, no auth.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
