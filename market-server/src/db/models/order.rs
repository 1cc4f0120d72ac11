//! Order and OrderItem Models

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;
use shared::{DeliveryType, OrderStatus, PaymentStatus};

/// Order model matching SurrealDB schema
///
/// Pricing invariant:
/// `total_amount == subtotal + delivery_fee + service_fee - discount_amount`
///
/// Orders are never deleted; cancellation is a status, not a removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub order_number: String,
    #[serde(with = "serde_helpers::record_id")]
    pub customer: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub vendor: RecordId,
    /// Unset until a rider is assigned
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub rider: Option<RecordId>,
    pub status: OrderStatus,
    pub delivery_type: DeliveryType,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub service_fee: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_instructions: Option<String>,
    /// 6-digit numeric code, pickup orders only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rider_notes: Option<String>,
    pub estimated_delivery_time: i64,
    // First-entry status timestamps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_for_pickup_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_for_delivery_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item
///
/// Snapshots `unit_price` at creation time so later product price
/// changes never alter a placed order.
/// Invariant: `total_price == unit_price * quantity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub order: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// Priced line item snapshot handed to the creation transaction.
/// Carries the resolved product reference and the price captured at
/// order time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemSnapshot {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub special_instructions: Option<String>,
}

/// Create order payload (API input)
#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreate {
    pub vendor_id: String,
    pub delivery_type: DeliveryType,
    pub items: Vec<OrderItemCreate>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub delivery_instructions: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub discount_amount: Option<f64>,
}

/// One requested line item
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemCreate {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub special_instructions: Option<String>,
}
