//! 网关配置

/// OCR 网关配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | OCR_HTTP_PORT | 5001 | HTTP 服务端口 |
/// | OCR_ENGINE_URL | http://127.0.0.1:8884 | 识别引擎地址 |
/// | OCR_ENGINE_TIMEOUT_SECS | 30 | 引擎请求超时（秒） |
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// HTTP 服务端口
    pub http_port: u16,
    /// 识别引擎地址，图片与 PDF 转发到这里
    pub engine_url: String,
    /// 引擎请求超时（秒）
    pub engine_timeout_secs: u64,
}

impl OcrConfig {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("OCR_HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),
            engine_url: std::env::var("OCR_ENGINE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8884".into()),
            engine_timeout_secs: std::env::var("OCR_ENGINE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
