//! Database Module
//!
//! Embedded SurrealDB storage (RocksDB backend)

pub mod models;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use shared::AppError;

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

/// Schema definitions applied at startup.
///
/// Unique indexes back the store-level invariants: duplicate
/// registration and order-number collisions fail at write time.
/// Reference columns are typed as records so string ids from the API
/// layer are coerced into real record links on write.
const SCHEMA: &str = r#"
    DEFINE INDEX IF NOT EXISTS user_email ON TABLE user COLUMNS email UNIQUE;
    DEFINE INDEX IF NOT EXISTS user_username ON TABLE user COLUMNS username UNIQUE;
    DEFINE INDEX IF NOT EXISTS order_number ON TABLE order COLUMNS order_number UNIQUE;
    DEFINE INDEX IF NOT EXISTS product_sku ON TABLE product COLUMNS sku UNIQUE;
    DEFINE INDEX IF NOT EXISTS assignment_pair ON TABLE assignment COLUMNS vendor, rider;

    DEFINE FIELD IF NOT EXISTS user ON TABLE vendor TYPE record<user>;
    DEFINE FIELD IF NOT EXISTS user ON TABLE rider TYPE record<user>;
    DEFINE FIELD IF NOT EXISTS vendor ON TABLE product TYPE record<vendor>;
    DEFINE FIELD IF NOT EXISTS category ON TABLE product TYPE record<category>;
    DEFINE FIELD IF NOT EXISTS vendor ON TABLE assignment TYPE record<vendor>;
    DEFINE FIELD IF NOT EXISTS rider ON TABLE assignment TYPE record<rider>;
    DEFINE FIELD IF NOT EXISTS customer ON TABLE order TYPE record<user>;
    DEFINE FIELD IF NOT EXISTS vendor ON TABLE order TYPE record<vendor>;
    DEFINE FIELD IF NOT EXISTS rider ON TABLE order TYPE option<record<rider>>;
    DEFINE FIELD IF NOT EXISTS order ON TABLE order_item TYPE record<order>;
    DEFINE FIELD IF NOT EXISTS product ON TABLE order_item TYPE record<product>;
"#;

impl DbService {
    /// Open (or create) the embedded database and apply schema definitions
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns("market")
            .use_db("market")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        db.query(SCHEMA)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;

        tracing::info!(path = %db_path, "Database connection established");

        Ok(Self { db })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{RepoError, UserRepository};
    use shared::{RegisterRequest, UserRole};

    fn register_payload(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "correct-horse-battery".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role: UserRole::Buyer,
            phone: None,
            address_line1: None,
            address_line2: None,
            city: None,
            postcode: None,
            country: None,
        }
    }

    #[tokio::test]
    async fn test_open_and_register() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let service = DbService::new(&db_path.to_string_lossy()).await.unwrap();

        let repo = UserRepository::new(service.db.clone());
        let user = repo
            .create(register_payload("alice", "alice@example.com"))
            .await
            .unwrap();
        assert!(user.id.is_some());
        assert_eq!(user.country, "UK");

        // Same email again is rejected
        let err = repo
            .create(register_payload("alice2", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));

        // Stored hash verifies the original password
        let found = repo.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert!(found.verify_password("correct-horse-battery").unwrap());
        assert!(!found.verify_password("wrong").unwrap());
    }
}
