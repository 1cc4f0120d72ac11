//! 认证与分页 DTO

use serde::{Deserialize, Serialize};

use crate::types::UserRole;

/// 注册请求
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// 登录请求
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 登录/注册成功载荷
#[derive(Debug, Serialize)]
pub struct AuthPayload<U> {
    pub token: String,
    pub user: U,
}

/// 分页响应信封
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub pages: u64,
    pub current_page: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, per_page: u64, current_page: u64) -> Self {
        let pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            items,
            total,
            pages,
            current_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        let page = Page::new(vec![1, 2, 3], 41, 20, 1);
        assert_eq!(page.pages, 3);
        assert_eq!(page.total, 41);
    }

    #[test]
    fn test_register_defaults_optional_fields() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username":"amara","email":"amara@example.com","password":"pw123456",
                "first_name":"Amara","last_name":"Obi","role":"buyer"}"#,
        )
        .unwrap();
        assert_eq!(req.role, UserRole::Buyer);
        assert!(req.phone.is_none());
        assert!(req.country.is_none());
    }
}
