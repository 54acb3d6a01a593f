//! Plain-text rendering of a BMI trend series.

use bmi_core::trend::{TrendSeries, REFERENCE_LINES};
use chrono::{DateTime, Utc};
use std::fmt::Write;

const MIN_ROWS: usize = 5;
const POINT: char = '●';
const GUIDE: char = '-';
/// Headroom above and below the plotted range
const PADDING: f64 = 1.0;

fn short_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Row index (0 = top) for a BMI value
fn row_for(value: f64, lo: f64, hi: f64, rows: usize) -> usize {
    let scaled = (hi - value) / (hi - lo) * (rows - 1) as f64;
    (scaled.round().max(0.0) as usize).min(rows - 1)
}

/// Render the series as a text chart with the category reference lines
///
/// Each reading takes two columns, oldest on the left.
pub fn render(series: &TrendSeries, rows: usize) -> String {
    let rows = rows.max(MIN_ROWS);
    let mut out = String::new();

    let (Some(min), Some(max)) = (series.min(), series.max()) else {
        return out;
    };

    // Always keep every reference line in view
    let lo = min.min(REFERENCE_LINES[0].bmi) - PADDING;
    let hi = max.max(REFERENCE_LINES[REFERENCE_LINES.len() - 1].bmi) + PADDING;
    let width = series.points.len() * 2;

    let mut grid = vec![vec![' '; width]; rows];
    let mut labels: Vec<Option<&str>> = vec![None; rows];

    for line in REFERENCE_LINES {
        let row = row_for(line.bmi, lo, hi, rows);
        grid[row].iter_mut().for_each(|c| *c = GUIDE);
        labels[row] = Some(line.label);
    }

    for (i, point) in series.points.iter().enumerate() {
        let row = row_for(point.bmi, lo, hi, rows);
        grid[row][i * 2] = POINT;
    }

    for (r, cells) in grid.iter().enumerate() {
        let value = hi - (hi - lo) * r as f64 / (rows - 1) as f64;
        let body: String = cells.iter().collect();
        let _ = write!(out, "{:>6.1} |{}", value, body);
        if let Some(label) = labels[r] {
            let _ = write!(out, " {}", label);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{:>6} +{}", "", "-".repeat(width));

    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        let _ = writeln!(
            out,
            "{:>8}{} .. {}",
            "",
            short_date(&first.recorded_at),
            short_date(&last.recorded_at)
        );
    }

    let change = series.change().unwrap_or(0.0);
    let _ = writeln!(
        out,
        "\nReadings: {}  Min: {:.2}  Max: {:.2}  Change: {:+.2}",
        series.points.len(),
        min,
        max,
        change
    );

    out
}
