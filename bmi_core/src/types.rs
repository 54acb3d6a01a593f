//! Core domain types for the BMI tracker.
//!
//! This module defines:
//! - BMI categories and their labels
//! - The engine's computed measurement bundle
//! - Persisted measurement records
//! - History ordering

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Category
// ============================================================================

/// Health category derived from a BMI value
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Underweight,
        Category::Normal,
        Category::Overweight,
        Category::Obese,
    ];

    /// Label as stored in the `category` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Underweight => "Underweight",
            Category::Normal => "Normal",
            Category::Overweight => "Overweight",
            Category::Obese => "Obese",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label that is not one of the four categories
#[derive(Debug, thiserror::Error)]
#[error("unknown BMI category label: {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let label = value.as_str()?;
        label
            .parse()
            .map_err(|e: UnknownCategory| FromSqlError::Other(Box::new(e)))
    }
}

// ============================================================================
// Measurement and Record Types
// ============================================================================

/// A validated BMI observation produced by the engine
///
/// Fields are private so the only way to obtain one is through
/// [`crate::engine::assess`]; `bmi` and `category` therefore always match
/// `weight_kg` and `height_m`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    weight_kg: f64,
    height_m: f64,
    bmi: f64,
    category: Category,
}

impl Measurement {
    pub(crate) fn new(weight_kg: f64, height_m: f64, bmi: f64, category: Category) -> Self {
        Self {
            weight_kg,
            height_m,
            bmi,
            category,
        }
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// A persisted measurement, as returned by the store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MeasurementRecord {
    pub id: i64,
    pub username: String,
    pub weight_kg: f64,
    pub height_m: f64,
    pub bmi: f64,
    pub category: Category,
    pub recorded_at: DateTime<Utc>,
}

/// Direction for history queries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HistoryOrder {
    /// Oldest first, for charting
    #[default]
    Ascending,
    /// Newest first, for listing
    Descending,
}
