//! Rider Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Rider model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rider {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_registration: Option<String>,
    pub is_active: bool,
    pub is_available: bool,
    pub is_verified: bool,
    pub rating: f64,
    pub total_deliveries: i64,
    pub successful_deliveries: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_location_update: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create rider profile payload
#[derive(Debug, Clone, Deserialize)]
pub struct RiderCreate {
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub vehicle_registration: Option<String>,
}

/// Update rider profile payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}
