//! OCR API 模块

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use super::GatewayState;

pub fn router() -> Router<GatewayState> {
    Router::new().nest("/api/ocr", routes())
}

fn routes() -> Router<GatewayState> {
    Router::new()
        .route("/process", post(handler::process))
        .route("/health", get(handler::health))
        .route("/test", post(handler::test))
        // Multipart envelope overhead on top of the 10MB file cap
        .layer(DefaultBodyLimit::max(handler::MAX_FILE_SIZE + 1024 * 1024))
}
