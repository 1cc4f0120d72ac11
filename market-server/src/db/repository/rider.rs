//! Rider Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Rider, RiderCreate, RiderUpdate};
use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "rider";

#[derive(Clone)]
pub struct RiderRepository {
    base: BaseRepository,
}

impl RiderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find rider by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Rider>> {
        let thing: RecordId = parse_id(TABLE, id)?;
        let rider: Option<Rider> = self.base.db().select(thing).await?;
        Ok(rider)
    }

    /// Find the rider profile owned by a user
    pub async fn find_by_user(&self, user_id: &RecordId) -> RepoResult<Option<Rider>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM rider WHERE user = $user LIMIT 1")
            .bind(("user", user_id.clone()))
            .await?;
        let riders: Vec<Rider> = result.take(0)?;
        Ok(riders.into_iter().next())
    }

    /// List active riders with optional availability/verified filters
    pub async fn find_page(
        &self,
        available: Option<bool>,
        verified: Option<bool>,
        page: u64,
        per_page: u64,
    ) -> RepoResult<(Vec<Rider>, u64)> {
        let start = (page.saturating_sub(1)) * per_page;

        const WHERE_CLAUSE: &str = r#"
            is_active = true
            AND ($available IS NONE OR is_available = $available)
            AND ($verified IS NONE OR is_verified = $verified)
        "#;

        let mut result = self
            .base
            .db()
            .query(format!(
                r#"
                SELECT * FROM rider WHERE {WHERE_CLAUSE}
                    ORDER BY created_at DESC LIMIT $limit START $start;
                SELECT count() AS total FROM rider WHERE {WHERE_CLAUSE} GROUP ALL;
                "#
            ))
            .bind(("available", available))
            .bind(("verified", verified))
            .bind(("limit", per_page))
            .bind(("start", start))
            .await?;

        let riders: Vec<Rider> = result.take(0)?;
        let total: Option<u64> = result.take((1, "total"))?;
        Ok((riders, total.unwrap_or(0)))
    }

    /// Create a rider profile for a user (one profile per user)
    pub async fn create(&self, user_id: &RecordId, data: RiderCreate) -> RepoResult<Rider> {
        if self.find_by_user(user_id).await?.is_some() {
            return Err(RepoError::Duplicate(
                "Rider profile already exists".to_string(),
            ));
        }

        let now = Utc::now().timestamp_millis();
        let rider = Rider {
            id: None,
            user: user_id.clone(),
            vehicle_type: data.vehicle_type,
            license_number: data.license_number,
            vehicle_registration: data.vehicle_registration,
            is_active: true,
            is_available: false,
            is_verified: false,
            rating: 0.0,
            total_deliveries: 0,
            successful_deliveries: 0,
            current_latitude: None,
            current_longitude: None,
            last_location_update: None,
            created_at: now,
            updated_at: now,
        };

        let created: Option<Rider> = self.base.db().create(TABLE).content(rider).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create rider".to_string()))
    }

    /// Update a rider profile (MERGE semantics)
    pub async fn update(&self, id: &str, data: RiderUpdate) -> RepoResult<Rider> {
        let thing: RecordId = parse_id(TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Rider {id} not found")))?;

        #[derive(serde::Serialize)]
        struct RiderUpdateDb {
            #[serde(flatten)]
            data: RiderUpdate,
            updated_at: i64,
        }

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing MERGE $data RETURN AFTER")
            .bind(("thing", thing))
            .bind((
                "data",
                RiderUpdateDb {
                    data,
                    updated_at: Utc::now().timestamp_millis(),
                },
            ))
            .await?;

        result
            .take::<Option<Rider>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Rider {id} not found")))
    }

    /// Toggle availability
    pub async fn set_available(&self, id: &str, available: bool) -> RepoResult<Rider> {
        let thing: RecordId = parse_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET is_available = $available, updated_at = $now RETURN AFTER")
            .bind(("thing", thing))
            .bind(("available", available))
            .bind(("now", Utc::now().timestamp_millis()))
            .await?;

        result
            .take::<Option<Rider>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Rider {id} not found")))
    }

    /// Record a GPS ping
    pub async fn update_location(&self, id: &str, lat: f64, lng: f64) -> RepoResult<Rider> {
        let thing: RecordId = parse_id(TABLE, id)?;
        let now = Utc::now().timestamp_millis();
        let mut result = self
            .base
            .db()
            .query(
                r#"
                UPDATE $thing SET
                    current_latitude = $lat,
                    current_longitude = $lng,
                    last_location_update = $now,
                    updated_at = $now
                RETURN AFTER
                "#,
            )
            .bind(("thing", thing))
            .bind(("lat", lat))
            .bind(("lng", lng))
            .bind(("now", now))
            .await?;

        result
            .take::<Option<Rider>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Rider {id} not found")))
    }

    /// Set the verified flag (admin operation)
    pub async fn set_verified(&self, id: &str, verified: bool) -> RepoResult<Rider> {
        let thing: RecordId = parse_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET is_verified = $verified, updated_at = $now RETURN AFTER")
            .bind(("thing", thing))
            .bind(("verified", verified))
            .bind(("now", Utc::now().timestamp_millis()))
            .await?;

        result
            .take::<Option<Rider>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Rider {id} not found")))
    }
}
