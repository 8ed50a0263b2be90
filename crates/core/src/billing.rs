//! Parking fee computation.
//!
//! Fees are proportional to wall-clock time: every started millisecond is
//! billed at `fee_rate / 3_600_000`. There is no minimum charge and no cap.
//! The result is rounded half away from zero to whole cents.

use crate::error::CoreError;
use crate::types::Timestamp;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Number of decimal places fees are rounded to.
pub const CURRENCY_DECIMALS: i32 = 2;

/// Validate an hourly fee rate: it must be finite and non-negative.
pub fn validate_fee_rate(fee_rate: f64) -> Result<(), CoreError> {
    if !fee_rate.is_finite() || fee_rate < 0.0 {
        return Err(CoreError::Validation(format!(
            "fee_rate must be a non-negative number, got {fee_rate}"
        )));
    }
    Ok(())
}

/// Fractional hours between `entry` and `exit`.
///
/// An exit earlier than the entry (clock skew between writers) counts as
/// zero time parked.
pub fn hours_between(entry: Timestamp, exit: Timestamp) -> f64 {
    let millis = (exit - entry).num_milliseconds().max(0);
    millis as f64 / MILLIS_PER_HOUR
}

/// Round to [`CURRENCY_DECIMALS`] places, half away from zero.
pub fn round_currency(amount: f64) -> f64 {
    let factor = 10f64.powi(CURRENCY_DECIMALS);
    (amount * factor).round() / factor
}

/// Compute the fee for a session parked from `entry` to `exit`.
pub fn compute_fee(entry: Timestamp, exit: Timestamp, fee_rate: f64) -> Result<f64, CoreError> {
    validate_fee_rate(fee_rate)?;
    Ok(round_currency(hours_between(entry, exit) * fee_rate))
}
