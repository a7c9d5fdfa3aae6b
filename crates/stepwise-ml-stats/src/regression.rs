use stepwise_ml_core::{TraceError, TraceResult};

use crate::descriptive::mean;

/// Pieces of the coefficient of determination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RSquaredParts {
    pub ss_res: f64,
    pub ss_tot: f64,
    pub r2: f64,
}

/// `R² = 1 − SS_res / SS_tot`; defined as 0 when the target is constant.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> TraceResult<RSquaredParts> {
    if actual.len() != predicted.len() {
        return Err(TraceError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    let y_mean = mean(actual)?;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p) * (y - p))
        .sum();
    let ss_tot: f64 = actual.iter().map(|y| (y - y_mean) * (y - y_mean)).sum();
    let r2 = if ss_tot == 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot };
    Ok(RSquaredParts { ss_res, ss_tot, r2 })
}
