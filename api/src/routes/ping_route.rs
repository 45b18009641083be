use axum::Json;
use serde_json::{Value, json};

/// Handler: GET /ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
