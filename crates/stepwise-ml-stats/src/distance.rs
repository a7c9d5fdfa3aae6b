use stepwise_ml_core::{TraceError, TraceResult};

/// `√Σ(aᵢ − bᵢ)²`
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> TraceResult<f64> {
    if a.len() != b.len() {
        return Err(TraceError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt())
}
