//! Currency helpers. Amounts are stored as integer cents and exposed as
//! two-decimal [`Decimal`] values.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, prelude::ToPrimitive};

/// Converts a non-negative amount to cents, rounding to two decimal places.
///
/// # Errors
/// Returns [`Error::Validation`] for negative or out-of-range amounts.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::validation(format!(
            "Amount cannot be negative: {amount}"
        )));
    }

    amount
        .round_dp(2)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| Error::validation(format!("Amount out of range: {amount}")))
}

/// Converts cents to a two-decimal amount.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
