use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearMeans {
    pub feature: String,
    pub target: String,
    pub x_mean: f64,
    pub y_mean: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSlope {
    /// Σ(xᵢ−x̄)(yᵢ−ȳ)
    pub numerator: f64,
    /// Σ(xᵢ−x̄)²
    pub denominator: f64,
    pub slope: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearIntercept {
    pub x_mean: f64,
    pub y_mean: f64,
    pub slope: f64,
    pub intercept: f64,
}

/// The fitted line `y = slope·x + intercept`, optionally with an ε-tube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionEquation {
    pub equation: String,
    pub slope: f64,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tube_half_width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePrediction {
    pub index: usize,
    pub x: f64,
    pub y_actual: f64,
    pub y_predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePredictions {
    pub samples: Vec<SamplePrediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RSquared {
    pub ss_res: f64,
    pub ss_tot: f64,
    pub r2_score: f64,
    pub interpretation: String,
}
