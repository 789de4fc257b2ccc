//! Input validation helpers.
//!
//! All checks use `!is_finite()` so NaN and infinities are rejected together
//! with out-of-range values.

use crate::error::{CalibError, Result};

/// Validate that a value is strictly positive and finite.
pub(crate) fn validate_positive(value: f64, name: &str) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalibError::invalid(format!(
            "{name} must be positive and finite, got {value}"
        )));
    }
    Ok(value)
}

/// Validate that a value is non-negative and finite.
pub(crate) fn validate_non_negative(value: f64, name: &str) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalibError::invalid(format!(
            "{name} must be non-negative and finite, got {value}"
        )));
    }
    Ok(value)
}

/// Validate that a value is finite; zero and negatives are allowed.
pub(crate) fn validate_finite(value: f64, name: &str) -> Result<f64> {
    if !value.is_finite() {
        return Err(CalibError::invalid(format!(
            "{name} must be finite, got {value}"
        )));
    }
    Ok(value)
}
