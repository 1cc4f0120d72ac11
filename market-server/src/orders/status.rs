//! Order status state machine
//!
//! The transition table is explicit: a target is reachable only from
//! its direct predecessor, and `cancelled` only from `pending`.
//! Terminal states accept nothing.

use shared::OrderStatus;

/// Valid target statuses from a given current status
pub fn allowed_targets(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Pending => &[Confirmed, Cancelled],
        Confirmed => &[Preparing],
        Preparing => &[ReadyForPickup],
        ReadyForPickup => &[OutForDelivery, Delivered],
        OutForDelivery => &[Delivered],
        Delivered | Cancelled => &[],
    }
}

/// Whether `from -> to` is a valid transition
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_targets(from).contains(&to)
}

/// Column stamped on first entry into a status, if any.
///
/// The repository only writes the stamp when the previous status
/// differs, so redundant updates never re-stamp or re-count.
pub fn stamp_column(to: OrderStatus) -> Option<&'static str> {
    match to {
        OrderStatus::Preparing => Some("preparation_started_at"),
        OrderStatus::ReadyForPickup => Some("ready_for_pickup_at"),
        OrderStatus::OutForDelivery => Some("out_for_delivery_at"),
        OrderStatus::Delivered => Some("delivered_at"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_happy_path_chain() {
        assert!(can_transition(Pending, Confirmed));
        assert!(can_transition(Confirmed, Preparing));
        assert!(can_transition(Preparing, ReadyForPickup));
        assert!(can_transition(ReadyForPickup, OutForDelivery));
        assert!(can_transition(OutForDelivery, Delivered));
    }

    #[test]
    fn test_pickup_handover_skips_delivery_leg() {
        assert!(can_transition(ReadyForPickup, Delivered));
    }

    #[test]
    fn test_cancel_only_from_pending() {
        assert!(can_transition(Pending, Cancelled));
        assert!(!can_transition(Confirmed, Cancelled));
        assert!(!can_transition(Preparing, Cancelled));
        assert!(!can_transition(OutForDelivery, Cancelled));
    }

    #[test]
    fn test_no_skipping_forward() {
        assert!(!can_transition(Pending, ReadyForPickup));
        assert!(!can_transition(Pending, Delivered));
        assert!(!can_transition(Confirmed, OutForDelivery));
    }

    #[test]
    fn test_no_moving_backward() {
        assert!(!can_transition(Preparing, Confirmed));
        assert!(!can_transition(Delivered, OutForDelivery));
    }

    #[test]
    fn test_terminal_states_are_dead_ends() {
        for target in [
            Pending,
            Confirmed,
            Preparing,
            ReadyForPickup,
            OutForDelivery,
            Delivered,
            Cancelled,
        ] {
            assert!(!can_transition(Delivered, target));
            assert!(!can_transition(Cancelled, target));
        }
    }

    #[test]
    fn test_self_transition_invalid() {
        for status in [Pending, Confirmed, Preparing, Delivered] {
            assert!(!can_transition(status, status));
        }
    }

    #[test]
    fn test_stamp_columns() {
        assert_eq!(stamp_column(Preparing), Some("preparation_started_at"));
        assert_eq!(stamp_column(Delivered), Some("delivered_at"));
        assert_eq!(stamp_column(Confirmed), None);
        assert_eq!(stamp_column(Cancelled), None);
    }
}
