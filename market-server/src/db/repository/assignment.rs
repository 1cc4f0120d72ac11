//! Vendor-Rider Assignment Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Assignment, Rider};
use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "assignment";

#[derive(Clone)]
pub struct AssignmentRepository {
    base: BaseRepository,
}

impl AssignmentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find the active assignment for a (vendor, rider) pair
    pub async fn find_active(
        &self,
        vendor: &RecordId,
        rider: &RecordId,
    ) -> RepoResult<Option<Assignment>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM assignment WHERE vendor = $vendor AND rider = $rider AND is_active = true LIMIT 1",
            )
            .bind(("vendor", vendor.clone()))
            .bind(("rider", rider.clone()))
            .await?;
        let rows: Vec<Assignment> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Assign a rider to a vendor's fleet.
    ///
    /// The rider must be active and verified. An already-active pair is a
    /// duplicate, not a second row.
    pub async fn assign(&self, vendor: &RecordId, rider: &Rider) -> RepoResult<Assignment> {
        if !rider.is_active || !rider.is_verified {
            return Err(RepoError::Validation(
                "Rider must be verified before assignment".to_string(),
            ));
        }
        let rider_id = rider
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Rider record without id".to_string()))?;

        if self.find_active(vendor, &rider_id).await?.is_some() {
            return Err(RepoError::Duplicate(
                "Rider is already assigned to this vendor".to_string(),
            ));
        }

        let assignment = Assignment {
            id: None,
            vendor: vendor.clone(),
            rider: rider_id,
            is_active: true,
            assigned_at: Utc::now().timestamp_millis(),
        };

        let created: Option<Assignment> = self.base.db().create(TABLE).content(assignment).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create assignment".to_string()))
    }

    /// Deactivate the active assignment for a pair
    pub async fn unassign(&self, vendor: &RecordId, rider: &RecordId) -> RepoResult<()> {
        let existing = self
            .find_active(vendor, rider)
            .await?
            .ok_or_else(|| RepoError::NotFound("No active assignment for this rider".to_string()))?;

        let thing = existing
            .id
            .ok_or_else(|| RepoError::Database("Assignment record without id".to_string()))?;

        self.base
            .db()
            .query("UPDATE $thing SET is_active = false")
            .bind(("thing", thing))
            .await?;
        Ok(())
    }

    /// All riders actively assigned to a vendor
    pub async fn riders_for_vendor(&self, vendor: &RecordId) -> RepoResult<Vec<Rider>> {
        let mut result = self
            .base
            .db()
            .query(
                r#"
                LET $rider_ids = (SELECT VALUE rider FROM assignment
                    WHERE vendor = $vendor AND is_active = true);
                SELECT * FROM rider WHERE id IN $rider_ids ORDER BY id ASC;
                "#,
            )
            .bind(("vendor", vendor.clone()))
            .await?;
        let riders: Vec<Rider> = result.take(1)?;
        Ok(riders)
    }

    /// Pick the auto-assignment candidate for a vendor: the available,
    /// verified, active assigned rider with the lowest id. Deterministic
    /// so repeated calls under contention agree on the winner.
    pub async fn eligible_rider(&self, vendor: &RecordId) -> RepoResult<Option<Rider>> {
        let mut result = self
            .base
            .db()
            .query(
                r#"
                LET $rider_ids = (SELECT VALUE rider FROM assignment
                    WHERE vendor = $vendor AND is_active = true);
                SELECT * FROM rider
                    WHERE id IN $rider_ids
                        AND is_active = true
                        AND is_available = true
                        AND is_verified = true
                    ORDER BY id ASC LIMIT 1;
                "#,
            )
            .bind(("vendor", vendor.clone()))
            .await?;
        let riders: Vec<Rider> = result.take(1)?;
        Ok(riders.into_iter().next())
    }
}
