//! Input acceptance policy for raw form text.
//!
//! Everything here runs before the store is touched, so a rejected
//! submission never produces a partial write.

use crate::error::{InvalidReason, MeasurementField};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Heights above this are assumed to be in the wrong unit
pub const MAX_HEIGHT_M: f64 = 3.0;

/// Unsigned decimal: optional integer part, optional fraction, no exponent
static NUMERIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d*\.?\d+$").expect("numeric pattern is valid"));

/// Trimmed, parsed form input ready for the engine
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedInput {
    pub username: String,
    pub weight_kg: f64,
    pub height_m: f64,
}

/// Trim a username and reject it if nothing is left
pub fn validate_username(raw: &str) -> Result<&str> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(Error::invalid(MeasurementField::Username, InvalidReason::Empty));
    }
    Ok(username)
}

fn parse_number(field: MeasurementField, raw: &str) -> Result<f64> {
    let text = raw.trim();
    if text.is_empty() || !NUMERIC_PATTERN.is_match(text) {
        return Err(Error::invalid(field, InvalidReason::NotNumeric));
    }
    text.parse::<f64>()
        .map_err(|_| Error::invalid(field, InvalidReason::NotNumeric))
}

fn ensure_positive(field: MeasurementField, value: f64) -> Result<f64> {
    if value <= 0.0 {
        return Err(Error::invalid(field, InvalidReason::NotPositive));
    }
    // Very long digit strings can overflow to infinity
    if !value.is_finite() {
        return Err(Error::invalid(field, InvalidReason::NotFinite));
    }
    Ok(value)
}

/// Parse a weight in kilograms
pub fn parse_weight(raw: &str) -> Result<f64> {
    let weight = parse_number(MeasurementField::Weight, raw)?;
    ensure_positive(MeasurementField::Weight, weight)
}

/// Parse a height in meters, rejecting values above [`MAX_HEIGHT_M`]
pub fn parse_height(raw: &str) -> Result<f64> {
    let height = parse_number(MeasurementField::Height, raw)?;
    let height = ensure_positive(MeasurementField::Height, height)?;
    if height > MAX_HEIGHT_M {
        return Err(Error::invalid(
            MeasurementField::Height,
            InvalidReason::ImplausiblyLarge,
        ));
    }
    Ok(height)
}

/// Validate all three form fields
///
/// Checks run in a fixed order: username, both numeric patterns, then
/// the range checks for weight and height.
pub fn validate_input(username: &str, weight: &str, height: &str) -> Result<ValidatedInput> {
    let username = validate_username(username)?;
    let weight_kg = parse_number(MeasurementField::Weight, weight)?;
    let height_m = parse_number(MeasurementField::Height, height)?;

    let weight_kg = ensure_positive(MeasurementField::Weight, weight_kg)?;
    let height_m = ensure_positive(MeasurementField::Height, height_m)?;
    if height_m > MAX_HEIGHT_M {
        return Err(Error::invalid(
            MeasurementField::Height,
            InvalidReason::ImplausiblyLarge,
        ));
    }

    Ok(ValidatedInput {
        username: username.to_string(),
        weight_kg,
        height_m,
    })
}
