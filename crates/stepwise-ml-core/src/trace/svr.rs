use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrHyperparameters {
    #[serde(rename = "C")]
    pub c: f64,
    pub epsilon: f64,
    pub unscaled_epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrStandardization {
    pub x_mean: f64,
    pub x_std: f64,
    pub y_mean: f64,
    pub y_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrObjective {
    pub objective_value: f64,
    pub scaled_slope: f64,
    pub scaled_intercept: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrSlope {
    pub scaled_slope: f64,
    pub x_std: f64,
    pub y_std: f64,
    pub slope: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrIntercept {
    pub scaled_intercept: f64,
    pub y_std: f64,
    pub y_mean: f64,
    pub x_mean: f64,
    pub slope: f64,
    pub intercept: f64,
}

/// A row's distance from the fitted line compared with the tube half-width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubeResidual {
    pub index: usize,
    pub x: f64,
    pub y_actual: f64,
    pub y_predicted: f64,
    pub residual: f64,
    pub is_support_vector: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrSupportVectors {
    pub unscaled_epsilon: f64,
    pub rows: Vec<TubeResidual>,
    pub support_vector_count: usize,
    pub total_points: usize,
}
