//! Order capability policy
//!
//! One table-driven check answers `(actor, operation, order)` for every
//! order operation; handlers never branch on roles inline.

use shared::{AppError, AppResult, OrderStatus, UserRole};

use super::status;

/// How the acting user relates to the order.
///
/// Handlers resolve these booleans from the store (the actor's vendor /
/// rider profile against the order's references) before consulting the
/// policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderRelation {
    /// Actor is the buyer who placed the order
    pub is_customer: bool,
    /// Actor owns the vendor the order was placed with
    pub is_order_vendor: bool,
    /// Actor is the rider assigned to the order
    pub is_assigned_rider: bool,
}

/// Operations on a single order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderAction {
    View,
    Transition {
        current: OrderStatus,
        target: OrderStatus,
    },
    AssignRider,
}

/// Targets a vendor may set on their own orders
const VENDOR_TARGETS: &[OrderStatus] = &[
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::ReadyForPickup,
];

/// Targets an assigned rider may set
const RIDER_TARGETS: &[OrderStatus] = &[OrderStatus::OutForDelivery, OrderStatus::Delivered];

/// Check whether the actor may perform the action on the order.
///
/// Transition checks validate the state machine first, then the actor
/// gate. Both failures surface as `Forbidden` (the split is visible in
/// logs only, matching the public API behavior).
pub fn check(role: UserRole, relation: OrderRelation, action: OrderAction) -> AppResult<()> {
    match action {
        OrderAction::View => {
            if role == UserRole::Admin
                || relation.is_customer
                || relation.is_order_vendor
                || relation.is_assigned_rider
            {
                Ok(())
            } else {
                Err(AppError::forbidden("Not authorized to view this order"))
            }
        }

        OrderAction::Transition { current, target } => {
            if !status::can_transition(current, target) {
                tracing::warn!(
                    from = current.as_str(),
                    to = target.as_str(),
                    "Rejected invalid status transition"
                );
                return Err(AppError::forbidden(format!(
                    "Cannot set status to {}",
                    target.as_str()
                )));
            }

            let actor_allowed = match role {
                UserRole::Admin => true,
                UserRole::Vendor => relation.is_order_vendor && VENDOR_TARGETS.contains(&target),
                UserRole::Rider => relation.is_assigned_rider && RIDER_TARGETS.contains(&target),
                UserRole::Buyer => relation.is_customer && target == OrderStatus::Cancelled,
            };

            if actor_allowed {
                Ok(())
            } else {
                tracing::warn!(
                    role = role.as_str(),
                    to = target.as_str(),
                    "Rejected status transition for actor"
                );
                Err(AppError::forbidden(format!(
                    "Cannot set status to {}",
                    target.as_str()
                )))
            }
        }

        OrderAction::AssignRider => {
            if role == UserRole::Admin || (role == UserRole::Vendor && relation.is_order_vendor) {
                Ok(())
            } else {
                Err(AppError::forbidden(
                    "Only the vendor or an admin can assign riders",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn customer() -> OrderRelation {
        OrderRelation {
            is_customer: true,
            ..Default::default()
        }
    }

    fn vendor() -> OrderRelation {
        OrderRelation {
            is_order_vendor: true,
            ..Default::default()
        }
    }

    fn rider() -> OrderRelation {
        OrderRelation {
            is_assigned_rider: true,
            ..Default::default()
        }
    }

    fn transition(current: OrderStatus, target: OrderStatus) -> OrderAction {
        OrderAction::Transition { current, target }
    }

    #[test]
    fn test_buyer_cancels_only_pending() {
        assert!(check(UserRole::Buyer, customer(), transition(Pending, Cancelled)).is_ok());
        // Cancelling a preparing order is denied
        assert!(check(UserRole::Buyer, customer(), transition(Preparing, Cancelled)).is_err());
        // Buyers never drive the forward chain
        assert!(check(UserRole::Buyer, customer(), transition(Pending, Confirmed)).is_err());
    }

    #[test]
    fn test_vendor_owns_preparation_phase() {
        assert!(check(UserRole::Vendor, vendor(), transition(Pending, Confirmed)).is_ok());
        assert!(check(UserRole::Vendor, vendor(), transition(Confirmed, Preparing)).is_ok());
        assert!(check(UserRole::Vendor, vendor(), transition(Preparing, ReadyForPickup)).is_ok());
        // Vendors hand off at the door
        assert!(
            check(
                UserRole::Vendor,
                vendor(),
                transition(ReadyForPickup, OutForDelivery)
            )
            .is_err()
        );
    }

    #[test]
    fn test_vendor_must_own_the_order() {
        assert!(
            check(
                UserRole::Vendor,
                OrderRelation::default(),
                transition(Pending, Confirmed)
            )
            .is_err()
        );
    }

    #[test]
    fn test_rider_owns_delivery_phase() {
        assert!(
            check(
                UserRole::Rider,
                rider(),
                transition(ReadyForPickup, OutForDelivery)
            )
            .is_ok()
        );
        assert!(check(UserRole::Rider, rider(), transition(OutForDelivery, Delivered)).is_ok());
        assert!(check(UserRole::Rider, rider(), transition(Pending, Confirmed)).is_err());
        // Unassigned rider gets nothing
        assert!(
            check(
                UserRole::Rider,
                OrderRelation::default(),
                transition(OutForDelivery, Delivered)
            )
            .is_err()
        );
    }

    #[test]
    fn test_admin_still_bound_by_state_machine() {
        assert!(check(UserRole::Admin, OrderRelation::default(), transition(Pending, Confirmed)).is_ok());
        // Even admins cannot jump pending -> delivered
        assert!(
            check(
                UserRole::Admin,
                OrderRelation::default(),
                transition(Pending, Delivered)
            )
            .is_err()
        );
    }

    #[test]
    fn test_view_scoping() {
        assert!(check(UserRole::Buyer, customer(), OrderAction::View).is_ok());
        assert!(check(UserRole::Vendor, vendor(), OrderAction::View).is_ok());
        assert!(check(UserRole::Rider, rider(), OrderAction::View).is_ok());
        assert!(check(UserRole::Admin, OrderRelation::default(), OrderAction::View).is_ok());
        assert!(check(UserRole::Buyer, OrderRelation::default(), OrderAction::View).is_err());
    }

    #[test]
    fn test_assign_rider_gate() {
        assert!(check(UserRole::Admin, OrderRelation::default(), OrderAction::AssignRider).is_ok());
        assert!(check(UserRole::Vendor, vendor(), OrderAction::AssignRider).is_ok());
        assert!(
            check(
                UserRole::Vendor,
                OrderRelation::default(),
                OrderAction::AssignRider
            )
            .is_err()
        );
        assert!(check(UserRole::Rider, rider(), OrderAction::AssignRider).is_err());
        assert!(check(UserRole::Buyer, customer(), OrderAction::AssignRider).is_err());
    }
}
