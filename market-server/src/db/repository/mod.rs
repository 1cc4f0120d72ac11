//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables.

pub mod assignment;
pub mod category;
pub mod order;
pub mod product;
pub mod rider;
pub mod user;
pub mod vendor;

// Re-exports
pub use assignment::AssignmentRepository;
pub use category::CategoryRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use rider::RiderRepository;
pub use user::UserRepository;
pub use vendor::VendorRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

use shared::AppError;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Insufficient stock: {0}")]
    Stock(String),

    #[error("Conflicting update: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Stock(msg) => AppError::InsufficientStock(msg),
            RepoError::Conflict(msg) => AppError::Conflict(msg),
            RepoError::Database(msg) => AppError::Database(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "product:abc".parse()?;
//   - 获取表名: id.table()
//   - CRUD: db.select(id) / db.delete(id) 直接使用 RecordId

/// Parse an id string, accepting either "key" or "table:key"
pub fn parse_id(table: &str, id: &str) -> RepoResult<surrealdb::RecordId> {
    let full = if id.contains(':') {
        id.to_string()
    } else {
        format!("{table}:{id}")
    };
    full.parse()
        .map_err(|_| RepoError::Validation(format!("Invalid ID: {id}")))
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_bare_key() {
        let id = parse_id("product", "abc123").unwrap();
        assert_eq!(id.table(), "product");
    }

    #[test]
    fn test_parse_id_accepts_full_form() {
        let id = parse_id("product", "product:abc123").unwrap();
        assert_eq!(id.table(), "product");
    }

    #[test]
    fn test_repo_error_status_mapping() {
        use shared::AppError;

        let err: AppError = RepoError::Duplicate("x".into()).into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = RepoError::Stock("x".into()).into();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        let err: AppError = RepoError::NotFound("x".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
