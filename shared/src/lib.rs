//! 市场平台共享类型库
//!
//! 为 market-server 与 ocr-gateway 提供统一的：
//!
//! - **错误类型** (`error`): [`AppError`] + [`AppResponse`] 统一响应结构
//! - **线上枚举** (`types`): 角色、订单状态、配送方式等封闭枚举
//! - **请求/响应 DTO** (`dto`): 认证与分页载荷

pub mod dto;
pub mod error;
pub mod types;

pub use dto::{AuthPayload, LoginRequest, Page, RegisterRequest};
pub use error::{AppError, AppResponse, AppResult, ok, ok_with_message};
pub use types::{DeliveryType, OrderStatus, PaymentStatus, UserRole};
