//! OCR Gateway - 购物清单文字识别网关
//!
//! 接收上传的小票 / 购物清单文件，文本文件直接解码，图片与 PDF
//! 转发给外部识别引擎，再用启发式规则抽取购物条目。
//!
//! # 模块结构
//!
//! ```text
//! ocr-gateway/src/
//! ├── api/        # HTTP 路由和处理器
//! ├── config.rs   # 环境变量配置
//! ├── engine.rs   # 外部识别引擎客户端
//! ├── error.rs    # 错误响应
//! ├── extract.rs  # 文本清洗与条目抽取
//! └── logger.rs   # 日志初始化
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod logger;

pub use config::OcrConfig;
pub use engine::{HttpEngine, TextExtractor};
pub use error::{OcrError, OcrResult};
