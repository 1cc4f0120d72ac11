//! API 路由模块

pub mod ocr;

use std::sync::Arc;

use crate::config::OcrConfig;
use crate::engine::TextExtractor;

/// 网关共享状态
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<OcrConfig>,
    pub engine: Arc<dyn TextExtractor>,
}

impl GatewayState {
    pub fn new(config: OcrConfig, engine: Arc<dyn TextExtractor>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}
