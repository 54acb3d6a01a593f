//! Trend series preparation for charting a user's history.
//!
//! Produces the oldest-first point list and summary values a chart
//! needs. Drawing is left to the caller.

use crate::engine::{round2, NORMAL_MIN, OBESE_MIN, OVERWEIGHT_MIN};
use crate::MeasurementRecord;
use chrono::{DateTime, Utc};

/// A horizontal guide drawn across the chart
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceLine {
    pub bmi: f64,
    pub label: &'static str,
}

/// Category thresholds shown on every chart
pub const REFERENCE_LINES: [ReferenceLine; 3] = [
    ReferenceLine {
        bmi: NORMAL_MIN,
        label: "Underweight",
    },
    ReferenceLine {
        bmi: OVERWEIGHT_MIN,
        label: "Overweight",
    },
    ReferenceLine {
        bmi: OBESE_MIN,
        label: "Obese",
    },
];

/// One plotted observation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrendPoint {
    pub recorded_at: DateTime<Utc>,
    pub bmi: f64,
}

/// Chronological BMI series for one user
#[derive(Clone, Debug, Default)]
pub struct TrendSeries {
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Build a series from records in any order
    pub fn from_records(records: &[MeasurementRecord]) -> Self {
        let mut sorted: Vec<&MeasurementRecord> = records.iter().collect();
        sorted.sort_by(|a, b| {
            a.recorded_at
                .cmp(&b.recorded_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Self {
            points: sorted
                .into_iter()
                .map(|r| TrendPoint {
                    recorded_at: r.recorded_at,
                    bmi: r.bmi,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrendPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrendPoint> {
        self.points.last()
    }

    /// Lowest BMI in the series
    pub fn min(&self) -> Option<f64> {
        self.points.iter().map(|p| p.bmi).reduce(f64::min)
    }

    /// Highest BMI in the series
    pub fn max(&self) -> Option<f64> {
        self.points.iter().map(|p| p.bmi).reduce(f64::max)
    }

    /// Last minus first, rounded to 2 decimals
    pub fn change(&self) -> Option<f64> {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => Some(round2(last.bmi - first.bmi)),
            _ => None,
        }
    }
}
