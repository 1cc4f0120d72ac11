use std::sync::Arc;

use tower_http::cors::CorsLayer;

use ocr_gateway::api::{GatewayState, ocr};
use ocr_gateway::{HttpEngine, OcrConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 加载环境变量和日志
    dotenv::dotenv().ok();
    ocr_gateway::logger::init_logger(
        std::env::var("LOG_LEVEL").ok().as_deref(),
        std::env::var("LOG_DIR").ok().as_deref(),
    );

    tracing::info!("OCR gateway starting...");

    // 2. 加载配置并构建引擎客户端
    let config = OcrConfig::from_env();
    let engine = Arc::new(HttpEngine::new(&config)?);
    let port = config.http_port;
    let state = GatewayState::new(config, engine);

    // 3. 启动 HTTP 服务器
    let app = ocr::router()
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("OCR gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}
