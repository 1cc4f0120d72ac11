//! Health API Handlers

use axum::Json;
use serde_json::{Value, json};

/// GET /health - 服务健康检查
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "market-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
