//! 外部识别引擎客户端
//!
//! 图片与 PDF 的文字识别交给一个独立的 HTTP 引擎服务完成，
//! 网关只负责转发字节流并取回文本。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::OcrConfig;
use crate::error::{OcrError, OcrResult};

/// 待识别文件的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Pdf,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Pdf => "pdf",
        }
    }
}

/// 引擎返回的识别结果
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    /// PDF 时为已处理页数
    #[serde(default)]
    pub pages_processed: Option<u32>,
}

/// 文字识别引擎抽象，便于在测试中替换
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, data: Vec<u8>, kind: MediaKind) -> OcrResult<ExtractedText>;
}

/// 基于 HTTP 的引擎客户端
///
/// POST `<engine_url>/extract/<kind>`，请求体为原始文件字节，
/// 响应为 `{text, pages_processed?}`。
pub struct HttpEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEngine {
    pub fn new(config: &OcrConfig) -> OcrResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.engine_timeout_secs))
            .build()
            .map_err(|e| OcrError::Engine(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.engine_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextExtractor for HttpEngine {
    async fn extract(&self, data: Vec<u8>, kind: MediaKind) -> OcrResult<ExtractedText> {
        let url = format!("{}/extract/{}", self.base_url, kind.as_str());
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| OcrError::Engine(format!("Engine request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(OcrError::Engine(format!(
                "Engine returned status {}",
                response.status()
            )));
        }

        response
            .json::<ExtractedText>()
            .await
            .map_err(|e| OcrError::Engine(format!("Invalid engine response: {e}")))
    }
}
