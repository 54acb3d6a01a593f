//! BMI engine: computation and categorization.
//!
//! Pure functions with no I/O. Rounding is round-half-away-from-zero to
//! two decimal places, which is what `f64::round` does on the scaled value.

use crate::error::{InvalidReason, MeasurementField};
use crate::{Category, Error, Measurement, Result};

/// Lower bound of the Normal band
pub const NORMAL_MIN: f64 = 18.5;
/// Lower bound of the Overweight band
pub const OVERWEIGHT_MIN: f64 = 25.0;
/// Lower bound of the Obese band
pub const OBESE_MIN: f64 = 30.0;

/// Round to two decimal places, halves away from zero
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn check_positive(field: MeasurementField, value: f64) -> Result<()> {
    // NaN fails this comparison too
    if !(value > 0.0) {
        return Err(Error::invalid(field, InvalidReason::NotPositive));
    }
    if !value.is_finite() {
        return Err(Error::invalid(field, InvalidReason::NotFinite));
    }
    Ok(())
}

/// Compute BMI as `weight_kg / height_m²`, rounded to 2 decimals
///
/// Height is checked before weight. A result that overflows to infinity
/// is blamed on the height, since only a vanishing divisor gets there.
pub fn compute_bmi(weight_kg: f64, height_m: f64) -> Result<f64> {
    check_positive(MeasurementField::Height, height_m)?;
    check_positive(MeasurementField::Weight, weight_kg)?;

    let bmi = round2(weight_kg / (height_m * height_m));
    if !bmi.is_finite() {
        return Err(Error::invalid(
            MeasurementField::Height,
            InvalidReason::ImplausiblySmall,
        ));
    }
    Ok(bmi)
}

/// Map a BMI value to its category using half-open bands
///
/// Total over all inputs; values below zero land in Underweight and NaN
/// falls through to Obese.
pub fn categorize(bmi: f64) -> Category {
    if bmi < NORMAL_MIN {
        Category::Underweight
    } else if bmi < OVERWEIGHT_MIN {
        Category::Normal
    } else if bmi < OBESE_MIN {
        Category::Overweight
    } else {
        Category::Obese
    }
}

/// Compute and categorize in one step
pub fn assess(weight_kg: f64, height_m: f64) -> Result<Measurement> {
    let bmi = compute_bmi(weight_kg, height_m)?;
    let category = categorize(bmi);
    tracing::debug!(weight_kg, height_m, bmi, %category, "Assessed measurement");
    Ok(Measurement::new(weight_kg, height_m, bmi, category))
}
