//! Regression metrics

use crate::{Error, Result};

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() {
        return Err(Error::Computation("metric over zero samples".into()));
    }
    if actual.len() != predicted.len() {
        return Err(Error::Computation(format!(
            "length mismatch: {} actual vs {} predicted",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Mean squared error
///
/// # Errors
/// Returns [`Error::Computation`] on empty or mismatched inputs
#[allow(clippy::cast_precision_loss)]
pub fn mse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error
///
/// # Errors
/// Returns [`Error::Computation`] on empty or mismatched inputs
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    mse(actual, predicted).map(f64::sqrt)
}

/// Mean absolute error
///
/// # Errors
/// Returns [`Error::Computation`] on empty or mismatched inputs
#[allow(clippy::cast_precision_loss)]
pub fn mae(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();
    Ok(sum / actual.len() as f64)
}
