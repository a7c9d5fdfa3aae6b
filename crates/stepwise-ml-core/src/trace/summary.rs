use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;

/// Headline result of a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub algorithm: Algorithm,
    pub dataset_size: usize,
    pub features_used: Vec<String>,
    pub target: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Outcome {
    /// A class label with its posterior / vote share.
    Classification {
        prediction: String,
        confidence: f64,
        classes: Vec<String>,
    },
    /// A fitted line.
    Fit {
        slope: f64,
        intercept: f64,
        equation: String,
        r2_score: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        support_vector_count: Option<usize>,
    },
    /// A numeric estimate for one query point.
    Estimate {
        prediction: f64,
        simple_prediction: f64,
        weighted_prediction: f64,
        k: usize,
    },
    /// The chosen root split.
    Split {
        best_feature: String,
        best_gain: f64,
        classes: Vec<String>,
    },
}

/// One point of the visualization series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartPoint {
    Fit {
        index: usize,
        x: f64,
        y_actual: f64,
        y_predicted: f64,
    },
    Tube {
        index: usize,
        x: f64,
        y_actual: f64,
        y_predicted: f64,
        upper_boundary: f64,
        lower_boundary: f64,
        is_support_vector: bool,
    },
    Neighbor {
        index: usize,
        features: Vec<f64>,
        target: f64,
        distance: f64,
        is_neighbor: bool,
    },
    Query {
        features: Vec<f64>,
        prediction: f64,
    },
}
