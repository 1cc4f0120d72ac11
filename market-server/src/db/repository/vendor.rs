//! Vendor Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Vendor, VendorCreate, VendorUpdate};
use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "vendor";

#[derive(Clone)]
pub struct VendorRepository {
    base: BaseRepository,
}

impl VendorRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find vendor by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Vendor>> {
        let thing: RecordId = parse_id(TABLE, id)?;
        let vendor: Option<Vendor> = self.base.db().select(thing).await?;
        Ok(vendor)
    }

    /// Find the vendor profile owned by a user
    pub async fn find_by_user(&self, user_id: &RecordId) -> RepoResult<Option<Vendor>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM vendor WHERE user = $user LIMIT 1")
            .bind(("user", user_id.clone()))
            .await?;
        let vendors: Vec<Vendor> = result.take(0)?;
        Ok(vendors.into_iter().next())
    }

    /// List active vendors with optional search and verified filters
    pub async fn find_page(
        &self,
        search: Option<String>,
        verified: Option<bool>,
        page: u64,
        per_page: u64,
    ) -> RepoResult<(Vec<Vendor>, u64)> {
        let search = search.unwrap_or_default();
        let start = (page.saturating_sub(1)) * per_page;

        const WHERE_CLAUSE: &str = r#"
            is_active = true
            AND ($verified IS NONE OR is_verified = $verified)
            AND ($search = "" OR string::lowercase(business_name) CONTAINS string::lowercase($search))
        "#;

        let mut result = self
            .base
            .db()
            .query(format!(
                r#"
                SELECT * FROM vendor WHERE {WHERE_CLAUSE}
                    ORDER BY business_name LIMIT $limit START $start;
                SELECT count() AS total FROM vendor WHERE {WHERE_CLAUSE} GROUP ALL;
                "#
            ))
            .bind(("verified", verified))
            .bind(("search", search))
            .bind(("limit", per_page))
            .bind(("start", start))
            .await?;

        let vendors: Vec<Vendor> = result.take(0)?;
        let total: Option<u64> = result.take((1, "total"))?;
        Ok((vendors, total.unwrap_or(0)))
    }

    /// Create a vendor profile for a user (one profile per user)
    pub async fn create(&self, user_id: &RecordId, data: VendorCreate) -> RepoResult<Vendor> {
        if self.find_by_user(user_id).await?.is_some() {
            return Err(RepoError::Duplicate(
                "Vendor profile already exists".to_string(),
            ));
        }

        let now = Utc::now().timestamp_millis();
        let vendor = Vendor {
            id: None,
            user: user_id.clone(),
            business_name: data.business_name,
            business_description: data.business_description,
            business_address: data.business_address,
            business_phone: data.business_phone,
            business_email: data.business_email,
            business_registration: data.business_registration,
            vat_number: data.vat_number,
            delivery_fee: data.delivery_fee.unwrap_or(3.0),
            peak_delivery_fee: data.peak_delivery_fee.unwrap_or(5.0),
            free_delivery_threshold: data.free_delivery_threshold.unwrap_or(25.0),
            delivery_radius: data.delivery_radius.unwrap_or(5.0),
            preparation_time: data.preparation_time.unwrap_or(30),
            is_active: true,
            is_verified: false,
            rating: 0.0,
            total_orders: 0,
            created_at: now,
            updated_at: now,
        };

        let created: Option<Vendor> = self.base.db().create(TABLE).content(vendor).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create vendor".to_string()))
    }

    /// Update a vendor profile (MERGE semantics)
    pub async fn update(&self, id: &str, data: VendorUpdate) -> RepoResult<Vendor> {
        let thing: RecordId = parse_id(TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Vendor {id} not found")))?;

        #[derive(serde::Serialize)]
        struct VendorUpdateDb {
            #[serde(flatten)]
            data: VendorUpdate,
            updated_at: i64,
        }

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing MERGE $data RETURN AFTER")
            .bind(("thing", thing))
            .bind((
                "data",
                VendorUpdateDb {
                    data,
                    updated_at: Utc::now().timestamp_millis(),
                },
            ))
            .await?;

        result
            .take::<Option<Vendor>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Vendor {id} not found")))
    }

    /// Set the verified flag (admin operation)
    pub async fn set_verified(&self, id: &str, verified: bool) -> RepoResult<Vendor> {
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
            .take::<Option<Vendor>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Vendor {id} not found")))
    }
}
