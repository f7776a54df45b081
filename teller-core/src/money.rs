//! Minor-unit amount helpers
//!
//! Balances and amounts are handled internally as `i64` counts of minor
//! currency units (cents), which keeps arithmetic exact. Callers hand the
//! service floating-point amounts; the helpers here validate them and round
//! to the nearest minor unit. The decimal form exists only at the boundary.

use crate::error::{Error, Result};
use rust_decimal::Decimal;

/// Minor units per major unit (cents per dollar)
pub const MINOR_PER_MAJOR: i64 = 100;

/// Decimal places of the boundary representation
pub const SCALE: u32 = 2;

/// Validate a transaction amount and convert to minor units
///
/// Rejects non-positive, NaN and infinite values; rounds to the nearest
/// minor unit.
pub fn require_positive(amount: f64) -> Result<i64> {
    if amount <= 0.0 || amount.is_nan() || amount.is_infinite() {
        return Err(Error::Validation(
            "amount must be positive and finite".to_string(),
        ));
    }
    to_minor(amount)
}

/// Validate an initial balance and convert to minor units
///
/// Like [`require_positive`] but zero is allowed.
pub fn require_non_negative(amount: f64) -> Result<i64> {
    if amount < 0.0 || amount.is_nan() || amount.is_infinite() {
        return Err(Error::Validation(
            "amount must be finite and >= 0".to_string(),
        ));
    }
    to_minor(amount)
}

/// Convert minor units to the boundary decimal form
pub fn to_decimal(minor: i64) -> Decimal {
    Decimal::new(minor, SCALE)
}

fn to_minor(amount: f64) -> Result<i64> {
    let minor = (amount * MINOR_PER_MAJOR as f64).round();
    if minor >= i64::MAX as f64 {
        return Err(Error::Validation("amount out of range".to_string()));
    }
    Ok(minor as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_amount_converts() {
        assert_eq!(require_positive(50.0).unwrap(), 5_000);
        assert_eq!(require_positive(0.01).unwrap(), 1);
        assert_eq!(require_positive(1200.00).unwrap(), 120_000);
    }

    #[test]
    fn test_rounds_to_nearest_minor_unit() {
        assert_eq!(require_positive(10.004).unwrap(), 1_000);
        assert_eq!(require_positive(10.006).unwrap(), 1_001);
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(require_positive(0.0).is_err());
        assert!(require_positive(-1.0).is_err());
    }

    #[test]
    fn test_rejects_nan_and_infinity() {
        assert!(require_positive(f64::NAN).is_err());
        assert!(require_positive(f64::INFINITY).is_err());
        assert!(require_positive(f64::NEG_INFINITY).is_err());
        assert!(require_non_negative(f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(require_positive(1e18).is_err());
    }

    #[test]
    fn test_non_negative_allows_zero() {
        assert_eq!(require_non_negative(0.0).unwrap(), 0);
        assert!(require_non_negative(-0.01).is_err());
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(to_decimal(55_000), Decimal::new(55_000, 2));
        assert_eq!(to_decimal(0), Decimal::ZERO);
    }
}
