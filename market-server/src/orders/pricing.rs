//! Order pricing
//!
//! Fee computation is pure: the caller supplies the wall-clock hour so
//! the peak window can be pinned in tests.

use shared::{AppError, AppResult, DeliveryType};

use crate::db::models::Vendor;

/// Fixed 5% platform fee applied to every order's subtotal
pub const SERVICE_FEE_RATE: f64 = 0.05;

/// Peak delivery window, inclusive wall-clock hours.
/// Not timezone-aware; kept as a documented limitation.
pub const PEAK_START_HOUR: u32 = 17;
pub const PEAK_END_HOUR: u32 = 20;

/// Flat extra minutes added to the estimate for delivery orders
pub const DELIVERY_EXTRA_MINUTES: i64 = 30;

/// Vendor fee schedule, detached from the persistence model
#[derive(Debug, Clone, Copy)]
pub struct FeeSchedule {
    pub delivery_fee: f64,
    pub peak_delivery_fee: f64,
    pub free_delivery_threshold: f64,
    /// Minutes
    pub preparation_time: i64,
}

impl From<&Vendor> for FeeSchedule {
    fn from(vendor: &Vendor) -> Self {
        Self {
            delivery_fee: vendor.delivery_fee,
            peak_delivery_fee: vendor.peak_delivery_fee,
            free_delivery_threshold: vendor.free_delivery_threshold,
            preparation_time: vendor.preparation_time,
        }
    }
}

/// Computed order pricing
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub service_fee: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Line total for one item
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    round2(unit_price * quantity as f64)
}

/// Fail with a message naming the product and its available quantity
pub fn ensure_stock(product_name: &str, available: i64, requested: i64) -> AppResult<()> {
    if requested > available {
        return Err(AppError::InsufficientStock(format!(
            "Insufficient stock for {product_name}: {available} available, {requested} requested"
        )));
    }
    Ok(())
}

/// Delivery fee for one order.
///
/// Zero for pickup, zero once the free-delivery threshold is met,
/// peak rate inside the 17:00-20:00 window, base rate otherwise.
pub fn delivery_fee(
    delivery_type: DeliveryType,
    subtotal: f64,
    schedule: &FeeSchedule,
    hour: u32,
) -> f64 {
    match delivery_type {
        DeliveryType::Pickup => 0.0,
        DeliveryType::Delivery => {
            if subtotal >= schedule.free_delivery_threshold {
                0.0
            } else if (PEAK_START_HOUR..=PEAK_END_HOUR).contains(&hour) {
                schedule.peak_delivery_fee
            } else {
                schedule.delivery_fee
            }
        }
    }
}

/// Full pricing for one order.
///
/// `total_amount == subtotal + delivery_fee + service_fee - discount_amount`
pub fn quote(
    subtotal: f64,
    schedule: &FeeSchedule,
    delivery_type: DeliveryType,
    discount_amount: f64,
    hour: u32,
) -> AppResult<Quote> {
    if discount_amount < 0.0 {
        return Err(AppError::Validation(
            "discount_amount cannot be negative".to_string(),
        ));
    }

    let subtotal = round2(subtotal);
    let delivery_fee = delivery_fee(delivery_type, subtotal, schedule, hour);
    let service_fee = round2(subtotal * SERVICE_FEE_RATE);
    let total_amount = round2(subtotal + delivery_fee + service_fee - discount_amount);

    Ok(Quote {
        subtotal,
        delivery_fee,
        service_fee,
        discount_amount,
        total_amount,
    })
}

/// Minutes until the estimated delivery / pickup time
pub fn estimated_minutes(schedule: &FeeSchedule, delivery_type: DeliveryType) -> i64 {
    match delivery_type {
        DeliveryType::Pickup => schedule.preparation_time,
        DeliveryType::Delivery => schedule.preparation_time + DELIVERY_EXTRA_MINUTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> FeeSchedule {
        FeeSchedule {
            delivery_fee: 3.50,
            peak_delivery_fee: 5.00,
            free_delivery_threshold: 25.00,
            preparation_time: 30,
        }
    }

    #[test]
    fn test_peak_fee_below_threshold() {
        // subtotal 20.00 at 18:00 (peak) -> 5.00
        let fee = delivery_fee(DeliveryType::Delivery, 20.00, &schedule(), 18);
        assert_eq!(fee, 5.00);
    }

    #[test]
    fn test_threshold_beats_peak() {
        // subtotal 30.00 at 18:00 -> free delivery
        let fee = delivery_fee(DeliveryType::Delivery, 30.00, &schedule(), 18);
        assert_eq!(fee, 0.0);
    }

    #[test]
    fn test_base_fee_off_peak() {
        let fee = delivery_fee(DeliveryType::Delivery, 20.00, &schedule(), 14);
        assert_eq!(fee, 3.50);

        // Window is inclusive on both ends
        assert_eq!(
            delivery_fee(DeliveryType::Delivery, 20.00, &schedule(), 17),
            5.00
        );
        assert_eq!(
            delivery_fee(DeliveryType::Delivery, 20.00, &schedule(), 20),
            5.00
        );
        assert_eq!(
            delivery_fee(DeliveryType::Delivery, 20.00, &schedule(), 21),
            3.50
        );
    }

    #[test]
    fn test_pickup_is_always_free() {
        let fee = delivery_fee(DeliveryType::Pickup, 5.00, &schedule(), 18);
        assert_eq!(fee, 0.0);
    }

    #[test]
    fn test_quote_invariant() {
        let q = quote(20.00, &schedule(), DeliveryType::Delivery, 1.50, 18).unwrap();
        assert_eq!(q.subtotal, 20.00);
        assert_eq!(q.delivery_fee, 5.00);
        assert_eq!(q.service_fee, 1.00); // 5% of 20.00
        assert_eq!(
            q.total_amount,
            q.subtotal + q.delivery_fee + q.service_fee - q.discount_amount
        );
        assert_eq!(q.total_amount, 24.50);
    }

    #[test]
    fn test_negative_discount_rejected() {
        assert!(quote(20.00, &schedule(), DeliveryType::Delivery, -1.0, 12).is_err());
    }

    #[test]
    fn test_line_total_snapshot() {
        assert_eq!(line_total(2.49, 3), 7.47);
    }

    #[test]
    fn test_ensure_stock_names_product_and_quantity() {
        let err = ensure_stock("Wild Honey", 2, 5).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Wild Honey"));
        assert!(msg.contains('2'));

        assert!(ensure_stock("Wild Honey", 5, 5).is_ok());
    }

    #[test]
    fn test_estimated_minutes() {
        assert_eq!(estimated_minutes(&schedule(), DeliveryType::Pickup), 30);
        assert_eq!(estimated_minutes(&schedule(), DeliveryType::Delivery), 60);
    }
}
