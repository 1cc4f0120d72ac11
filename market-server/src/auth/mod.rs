//! 认证模块 - JWT 令牌与请求提取器

mod extractor;
mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
