//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 认证相关接口
//! - [`users`] - 用户管理接口
//! - [`categories`] - 分类管理接口
//! - [`products`] - 商品管理接口
//! - [`vendors`] - 商家管理接口
//! - [`riders`] - 骑手管理接口
//! - [`orders`] - 订单管理接口

pub mod auth;
pub mod categories;
pub mod health;
pub mod orders;
pub mod products;
pub mod riders;
pub mod users;
pub mod vendors;

// Re-export common types for handlers
pub use shared::{AppResponse, AppResult};
