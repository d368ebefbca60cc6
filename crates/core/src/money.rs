//! Monetary amounts.
//!
//! Amounts are plain `f64` values in the sale's currency. Authoritative sums
//! are never rounded; rounding to cents happens only when an amount is split
//! into installments, and comparisons for "balanced" use [`TOLERANCE`].

use crate::error::{DomainError, DomainResult};

/// Two amounts closer than this are considered equal.
pub const TOLERANCE: f64 = 0.01;

/// Returns true when `a` and `b` differ by less than [`TOLERANCE`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

/// Returns true when `amount` is zero within [`TOLERANCE`].
pub fn is_zero(amount: f64) -> bool {
    amount.abs() < TOLERANCE
}

/// Truncate a non-negative amount to whole cents.
///
/// A tiny epsilon keeps values such as `0.29` (stored as `0.28999…`) from
/// losing a cent.
pub fn floor_cents(amount: f64) -> f64 {
    (amount * 100.0 + 1e-9).floor() / 100.0
}

/// Validate that `amount` is a finite, non-negative number.
pub fn ensure_non_negative(field: &str, amount: f64) -> DomainResult<f64> {
    if !amount.is_finite() {
        return Err(DomainError::validation(format!("{field} must be a finite number")));
    }
    if amount < 0.0 {
        return Err(DomainError::validation(format!("{field} must not be negative")));
    }
    Ok(amount)
}

/// Validate that `amount` is a finite, strictly positive number.
pub fn ensure_positive(field: &str, amount: f64) -> DomainResult<f64> {
    ensure_non_negative(field, amount)?;
    if amount == 0.0 {
        return Err(DomainError::validation(format!("{field} must be positive")));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_uses_one_cent_tolerance() {
        assert!(approx_eq(100.0, 100.009));
        assert!(!approx_eq(100.0, 100.02));
    }

    #[test]
    fn floor_cents_truncates_without_float_artifacts() {
        assert_eq!(floor_cents(66.666_666), 66.66);
        assert_eq!(floor_cents(0.29), 0.29);
        assert_eq!(floor_cents(0.009), 0.0);
    }

    #[test]
    fn negative_and_nan_amounts_are_rejected() {
        assert!(ensure_non_negative("down payment", -1.0).is_err());
        assert!(ensure_non_negative("down payment", f64::NAN).is_err());
        assert!(ensure_non_negative("down payment", 0.0).is_ok());
        assert!(ensure_positive("value", 0.0).is_err());
    }
}
