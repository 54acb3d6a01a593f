//! Error types for the bmi_core library.

use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Input field that failed validation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasurementField {
    Username,
    Weight,
    Height,
}

impl fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeasurementField::Username => "Username",
            MeasurementField::Weight => "Weight",
            MeasurementField::Height => "Height",
        };
        f.write_str(name)
    }
}

/// Why a field was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    /// Empty after trimming surrounding whitespace
    Empty,
    /// Did not match the plain decimal pattern
    NotNumeric,
    /// Zero, negative or NaN
    NotPositive,
    /// Infinite
    NotFinite,
    /// Above the plausible metric range (height only)
    ImplausiblyLarge,
    /// So small the resulting BMI is not a finite number (height only)
    ImplausiblySmall,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InvalidReason::Empty => "must not be empty",
            InvalidReason::NotNumeric => "must be a plain decimal number (e.g. 1.75)",
            InvalidReason::NotPositive => "must be greater than zero",
            InvalidReason::NotFinite => "must be a finite number",
            InvalidReason::ImplausiblyLarge => {
                "seems too large; enter height in meters (e.g. 1.75)"
            }
            InvalidReason::ImplausiblySmall => {
                "is too small to give a finite BMI; enter height in meters (e.g. 1.75)"
            }
        };
        f.write_str(text)
    }
}

/// Core error type for bmi_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or out-of-range user input
    #[error("Invalid measurement: {field} {reason}")]
    InvalidMeasurement {
        field: MeasurementField,
        reason: InvalidReason,
    },

    /// Persistence medium unreachable or write failed
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Error {
    pub(crate) fn invalid(field: MeasurementField, reason: InvalidReason) -> Self {
        Error::InvalidMeasurement { field, reason }
    }

    /// True for errors the user can fix by correcting their input
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidMeasurement { .. })
    }
}
