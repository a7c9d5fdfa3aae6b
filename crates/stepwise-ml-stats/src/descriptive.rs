use stepwise_ml_core::{TraceError, TraceResult};

fn non_empty(values: &[f64], what: &str) -> TraceResult<()> {
    if values.is_empty() {
        Err(TraceError::EmptyInput(what.to_string()))
    } else {
        Ok(())
    }
}

fn same_len(a: &[f64], b: &[f64]) -> TraceResult<()> {
    if a.len() != b.len() {
        Err(TraceError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        })
    } else {
        Ok(())
    }
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> TraceResult<f64> {
    non_empty(values, "mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Σ(xᵢ − x̄)²
pub fn sum_of_squares(values: &[f64]) -> TraceResult<f64> {
    let m = mean(values)?;
    Ok(values.iter().map(|v| (v - m) * (v - m)).sum())
}

/// Σ(xᵢ − x̄)(yᵢ − ȳ)
pub fn sum_of_products(xs: &[f64], ys: &[f64]) -> TraceResult<f64> {
    same_len(xs, ys)?;
    let mx = mean(xs)?;
    let my = mean(ys)?;
    Ok(xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum())
}

/// Population variance.
pub fn variance(values: &[f64]) -> TraceResult<f64> {
    Ok(sum_of_squares(values)? / values.len() as f64)
}

/// Population standard deviation.
pub fn stddev(values: &[f64]) -> TraceResult<f64> {
    Ok(variance(values)?.sqrt())
}

/// Population covariance.
pub fn covariance(xs: &[f64], ys: &[f64]) -> TraceResult<f64> {
    Ok(sum_of_products(xs, ys)? / xs.len() as f64)
}

/// `Σ(vᵢ·wᵢ) / Σwᵢ`. Fails with [`TraceError::ZeroWeight`] when the weights
/// sum to zero; callers fall back to [`mean`].
pub fn weighted_average(values: &[f64], weights: &[f64]) -> TraceResult<f64> {
    non_empty(values, "weighted_average")?;
    same_len(values, weights)?;
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return Err(TraceError::ZeroWeight);
    }
    Ok(values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_variance() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(mean(&v).unwrap(), 5.0);
        assert_abs_diff_eq!(variance(&v).unwrap(), 4.0);
        assert_abs_diff_eq!(stddev(&v).unwrap(), 2.0);
    }

    #[test]
    fn test_covariance() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 3.0, 5.0, 4.0, 6.0];
        assert_abs_diff_eq!(sum_of_products(&xs, &ys).unwrap(), 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sum_of_squares(&xs).unwrap(), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(covariance(&xs, &ys).unwrap(), 1.8, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_and_mismatch() {
        assert!(matches!(mean(&[]), Err(TraceError::EmptyInput(_))));
        assert!(matches!(variance(&[]), Err(TraceError::EmptyInput(_))));
        assert_eq!(
            covariance(&[1.0, 2.0], &[1.0]),
            Err(TraceError::DimensionMismatch { expected: 2, got: 1 })
        );
    }

    #[test]
    fn test_weighted_average() {
        assert_abs_diff_eq!(weighted_average(&[1.0, 3.0], &[1.0, 3.0]).unwrap(), 2.5);
        assert_eq!(weighted_average(&[1.0, 3.0], &[0.0, 0.0]), Err(TraceError::ZeroWeight));
    }
}
