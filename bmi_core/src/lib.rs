#![forbid(unsafe_code)]

//! Core domain model and persistence for the BMI tracker.
//!
//! This crate provides:
//! - Domain types (categories, measurements, persisted records)
//! - BMI engine (computation and categorization)
//! - Input validation for raw form text
//! - Measurement store (SQLite-backed per-user history)
//! - Trend series preparation for charting

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod engine;
pub mod validation;
pub mod store;
pub mod trend;

// Re-export commonly used types
pub use error::{Error, InvalidReason, MeasurementField, Result};
pub use types::*;
pub use config::Config;
pub use engine::{assess, categorize, compute_bmi};
pub use validation::{validate_input, ValidatedInput};
pub use store::{MeasurementStore, StoreOptions};
pub use trend::{TrendSeries, REFERENCE_LINES};
