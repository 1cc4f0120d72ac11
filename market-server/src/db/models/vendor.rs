//! Vendor Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Vendor model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub business_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_number: Option<String>,
    pub delivery_fee: f64,
    pub peak_delivery_fee: f64,
    pub free_delivery_threshold: f64,
    /// Delivery radius in miles
    pub delivery_radius: f64,
    /// Preparation time in minutes
    pub preparation_time: i64,
    pub is_active: bool,
    pub is_verified: bool,
    pub rating: f64,
    pub total_orders: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create vendor profile payload
#[derive(Debug, Clone, Deserialize)]
pub struct VendorCreate {
    pub business_name: String,
    #[serde(default)]
    pub business_description: Option<String>,
    #[serde(default)]
    pub business_address: Option<String>,
    #[serde(default)]
    pub business_phone: Option<String>,
    #[serde(default)]
    pub business_email: Option<String>,
    #[serde(default)]
    pub business_registration: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub delivery_fee: Option<f64>,
    #[serde(default)]
    pub peak_delivery_fee: Option<f64>,
    #[serde(default)]
    pub free_delivery_threshold: Option<f64>,
    #[serde(default)]
    pub delivery_radius: Option<f64>,
    #[serde(default)]
    pub preparation_time: Option<i64>,
}

/// Update vendor profile payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_delivery_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_delivery_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_time: Option<i64>,
}
