//! Order number and pickup code generation

use chrono::NaiveDate;
use rand::Rng;

const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Generate an order number: `HO-<YYYYMMDD>-<6 uppercase alphanumeric>`.
///
/// Uniqueness is enforced by the store's unique index on
/// `order.order_number`, not here.
pub fn generate_order_number(date: NaiveDate) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ORDER_NUMBER_CHARSET.len());
            ORDER_NUMBER_CHARSET[idx] as char
        })
        .collect();
    format!("HO-{}-{}", date.format("%Y%m%d"), suffix)
}

/// Generate a 6-digit numeric pickup code.
///
/// No uniqueness guarantee across orders.
pub fn generate_pickup_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(0..1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let number = generate_order_number(date);

        assert_eq!(number.len(), "HO-20250314-XXXXXX".len());
        assert!(number.starts_with("HO-20250314-"));

        let suffix = &number["HO-20250314-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_pickup_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_pickup_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
