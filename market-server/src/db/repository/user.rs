//! User Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{User, UserUpdate};
use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use shared::{RegisterRequest, UserRole};

const TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let thing: RecordId = parse_id(TABLE, id)?;
        let user: Option<User> = self.base.db().select(thing).await?;
        Ok(user)
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email_owned = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Find user by username
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let username_owned = username.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// List users with optional role filter, newest first
    pub async fn find_page(
        &self,
        role: Option<UserRole>,
        page: u64,
        per_page: u64,
    ) -> RepoResult<(Vec<User>, u64)> {
        let start = (page.saturating_sub(1)) * per_page;
        let mut result = self
            .base
            .db()
            .query(
                r#"
                SELECT * FROM user
                    WHERE $has_role = false OR role = $role
                    ORDER BY created_at DESC
                    LIMIT $limit START $start;
                SELECT count() AS total FROM user
                    WHERE $has_role = false OR role = $role
                    GROUP ALL;
                "#,
            )
            .bind(("has_role", role.is_some()))
            .bind(("role", role))
            .bind(("limit", per_page))
            .bind(("start", start))
            .await?;

        let users: Vec<User> = result.take(0)?;
        let total: Option<u64> = result.take((1, "total"))?;
        Ok((users, total.unwrap_or(0)))
    }

    /// Register a new user
    pub async fn create(&self, data: RegisterRequest) -> RepoResult<User> {
        if self.find_by_email(&data.email).await?.is_some() {
            return Err(RepoError::Duplicate("Email already registered".to_string()));
        }
        if self.find_by_username(&data.username).await?.is_some() {
            return Err(RepoError::Duplicate("Username already taken".to_string()));
        }

        let hash_pass = User::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;
        let now = Utc::now().timestamp_millis();

        let user = User {
            id: None,
            username: data.username,
            email: data.email,
            hash_pass,
            first_name: data.first_name,
            last_name: data.last_name,
            role: data.role,
            phone: data.phone,
            address_line1: data.address_line1,
            address_line2: data.address_line2,
            city: data.city,
            postcode: data.postcode,
            country: data.country.unwrap_or_else(|| "UK".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        // The unique indexes on email/username are the final arbiter
        // against concurrent duplicate registration.
        let created: Option<User> = self
            .base
            .db()
            .create(TABLE)
            .content(user)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("user_email") || msg.contains("user_username") {
                    RepoError::Duplicate("Email or username already registered".to_string())
                } else {
                    RepoError::Database(msg)
                }
            })?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Update a user (MERGE semantics, password re-hashed when present)
    pub async fn update(&self, id: &str, data: UserUpdate) -> RepoResult<User> {
        let thing: RecordId = parse_id(TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))?;

        let hash_pass = match &data.password {
            Some(password) => Some(
                User::hash_password(password)
                    .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?,
            ),
            None => None,
        };

        #[derive(serde::Serialize)]
        struct UserUpdateDb {
            #[serde(skip_serializing_if = "Option::is_none")]
            first_name: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            last_name: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            phone: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            address_line1: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            address_line2: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            city: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            postcode: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            country: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            hash_pass: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            role: Option<UserRole>,
            #[serde(skip_serializing_if = "Option::is_none")]
            is_active: Option<bool>,
            updated_at: i64,
        }

        let update_data = UserUpdateDb {
            first_name: data.first_name,
            last_name: data.last_name,
            phone: data.phone,
            address_line1: data.address_line1,
            address_line2: data.address_line2,
            city: data.city,
            postcode: data.postcode,
            country: data.country,
            hash_pass,
            role: data.role,
            is_active: data.is_active,
            updated_at: Utc::now().timestamp_millis(),
        };

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing MERGE $data RETURN AFTER")
            .bind(("thing", thing))
            .bind(("data", update_data))
            .await?;

        result
            .take::<Option<User>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
    }

    /// Hard delete a user (admin only, never self)
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = parse_id(TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
