use stepwise_ml_core::{TraceError, TraceResult};
use stepwise_ml_stats::{mean, stddev};

/// Standardize features by removing the mean and scaling to unit variance.
///
/// Uses the population standard deviation. A constant feature keeps a scale
/// of 1 so it contributes zero after centering instead of dividing by zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute per-feature mean and std from rows `[samples][features]`.
    pub fn fit(&mut self, rows: &[Vec<f64>]) -> TraceResult<()> {
        let first = rows
            .first()
            .ok_or_else(|| TraceError::EmptyInput("StandardScaler::fit".into()))?;
        let p = first.len();
        let mut mean_vals = Vec::with_capacity(p);
        let mut std_vals = Vec::with_capacity(p);
        for j in 0..p {
            let mut column = Vec::with_capacity(rows.len());
            for row in rows {
                if row.len() != p {
                    return Err(TraceError::DimensionMismatch {
                        expected: p,
                        got: row.len(),
                    });
                }
                column.push(row[j]);
            }
            mean_vals.push(mean(&column)?);
            std_vals.push(stddev(&column)?);
        }
        self.mean = mean_vals;
        self.std = std_vals;
        Ok(())
    }

    /// Scale used for feature `j`: its std, or 1 for a constant feature.
    pub fn scale(&self, j: usize) -> f64 {
        let s = self.std[j];
        if s.abs() < f64::EPSILON {
            1.0
        } else {
            s
        }
    }

    /// `(x − mean) / scale` for one row.
    pub fn transform_row(&self, row: &[f64]) -> TraceResult<Vec<f64>> {
        if row.len() != self.mean.len() {
            return Err(TraceError::DimensionMismatch {
                expected: self.mean.len(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .enumerate()
            .map(|(j, v)| (v - self.mean[j]) / self.scale(j))
            .collect())
    }

    /// Euclidean distance between two raw rows in standardized space,
    /// `√Σ((aⱼ − bⱼ) / scaleⱼ)²`.
    ///
    /// The difference is taken before scaling, so rows at the same raw offset
    /// from `b` get bit-identical distances.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> TraceResult<f64> {
        for row in [a, b] {
            if row.len() != self.mean.len() {
                return Err(TraceError::DimensionMismatch {
                    expected: self.mean.len(),
                    got: row.len(),
                });
            }
        }
        Ok(a.iter()
            .zip(b)
            .enumerate()
            .map(|(j, (x, y))| {
                let d = (x - y) / self.scale(j);
                d * d
            })
            .sum::<f64>()
            .sqrt())
    }
}
