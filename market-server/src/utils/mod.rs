//! 工具模块

pub mod logger;

pub use shared::{AppError, AppResult, ok, ok_with_message};
