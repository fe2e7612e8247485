//! Money calculation utilities using rust_decimal for precision
//!
//! Amounts travel as `f64` (JSON, SQLite REAL) and are converted to `Decimal`
//! for arithmetic and comparison, then rounded to 2 decimal places
//! (half away from zero) before storage or sending to the payment gateway.

use rust_decimal::prelude::*;
use shared::models::CartItem;

const DECIMAL_PLACES: u32 = 2;

/// Upper bound for any single amount
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Convert f64 to Decimal; non-finite input yields `None`
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

/// Round to cents
pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_else(|| {
        tracing::error!(value = %value, "Decimal not representable as f64, defaulting to zero");
        0.0
    })
}

/// Validated, rounded positive amount
pub fn positive_amount(value: f64, field: &str) -> Result<Decimal, String> {
    let amount = to_decimal(value).ok_or_else(|| format!("{field} must be a finite number"))?;
    let amount = round(amount);
    if amount <= Decimal::ZERO {
        return Err(format!("{field} must be greater than zero"));
    }
    if value > MAX_AMOUNT {
        return Err(format!("{field} exceeds the maximum of {MAX_AMOUNT}"));
    }
    Ok(amount)
}

/// Sum of `price * quantity` over the cart, rounded to cents.
///
/// Quantity defaults to 1; every item must carry a price.
pub fn cart_total(items: &[CartItem]) -> Result<Decimal, String> {
    if items.is_empty() {
        return Err("cart is empty".to_string());
    }
    let mut total = Decimal::ZERO;
    for (index, item) in items.iter().enumerate() {
        let price = item
            .price
            .ok_or_else(|| format!("cart item {index} has no price"))?;
        let price = to_decimal(price).ok_or_else(|| format!("cart item {index} has an invalid price"))?;
        if price < Decimal::ZERO {
            return Err(format!("cart item {index} has a negative price"));
        }
        let quantity = Decimal::from(item.quantity.unwrap_or(1));
        total += price * quantity;
    }
    let total = round(total);
    if total <= Decimal::ZERO {
        return Err("cart total must be greater than zero".to_string());
    }
    Ok(total)
}

/// Amount as the gateway expects it: fixed 2 decimals, e.g. `"150.00"`
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(price: f64, quantity: Option<u32>) -> CartItem {
        CartItem {
            booking_id: Some(1),
            price: Some(price),
            quantity,
        }
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round(dec("1.005")), dec("1.01"));
        assert_eq!(round(dec("2.344")), dec("2.34"));
        assert_eq!(to_f64(dec("99.999")), 100.0);
    }

    #[test]
    fn test_to_decimal_rejects_non_finite() {
        assert!(to_decimal(f64::NAN).is_none());
        assert!(to_decimal(f64::INFINITY).is_none());
        assert_eq!(to_decimal(150.0), Some(dec("150")));
    }

    #[test]
    fn test_positive_amount() {
        assert_eq!(positive_amount(150.0, "total_price"), Ok(dec("150.00")));
        assert!(positive_amount(0.0, "total_price").is_err());
        assert!(positive_amount(-5.0, "total_price").is_err());
        assert!(positive_amount(0.001, "total_price").is_err());
    }

    #[test]
    fn test_cart_total() {
        let items = vec![item(100.0, None), item(25.5, Some(2))];
        assert_eq!(cart_total(&items), Ok(dec("151.00")));

        assert!(cart_total(&[]).is_err());
        let missing_price = CartItem {
            booking_id: Some(1),
            price: None,
            quantity: None,
        };
        assert!(cart_total(&[missing_price]).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("150")), "150.00");
        assert_eq!(format_amount(dec("0.1")), "0.10");
    }
}
