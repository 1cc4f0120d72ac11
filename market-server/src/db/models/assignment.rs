//! Vendor-Rider Assignment Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Active/inactive assignment between a vendor and a rider.
///
/// Invariant: at most one active row per (vendor, rider) pair.
/// Re-assignment deactivates the prior row instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub vendor: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub rider: RecordId,
    pub is_active: bool,
    pub assigned_at: i64,
}
