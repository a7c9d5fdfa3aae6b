use serde::{Deserialize, Serialize};

use super::FeatureValue;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnConfiguration {
    pub k: usize,
    pub features: Vec<String>,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    pub dataset_size: usize,
    pub query: Vec<FeatureValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// `z = (x − μ) / σ` per feature.
    ZScore,
    /// Distances in the raw feature space.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaling {
    pub feature: String,
    pub mean: f64,
    pub std: f64,
}

/// Categories of a label-encoded feature; the code is the position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeature {
    pub feature: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnPreprocessing {
    pub scaling: Scaling,
    pub encoded: Vec<EncodedFeature>,
    pub scalers: Vec<FeatureScaling>,
    /// The query in the space distances are measured in.
    pub query_vector: Vec<f64>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborDistance {
    pub index: usize,
    pub distance: f64,
    pub target: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub rank: usize,
    pub index: usize,
    pub distance: f64,
    pub target: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnNeighbors {
    /// Distance from the query to every training row, in row order.
    pub distances: Vec<NeighborDistance>,
    /// The k closest rows, ascending by distance then row index.
    pub neighbors: Vec<Neighbor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteShare {
    pub class: String,
    pub votes: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnVote {
    pub votes: Vec<VoteShare>,
    pub total_votes: usize,
    pub majority_class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnAverage {
    pub neighbor_values: Vec<f64>,
    pub prediction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborWeight {
    pub index: usize,
    pub distance: f64,
    pub weight: f64,
    pub weighted_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnWeightedAverage {
    pub weights: Vec<NeighborWeight>,
    pub total_weight: f64,
    pub weighted_prediction: f64,
    /// Set when every neighbor sits at the same distance.
    pub fallback_to_simple: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Simple,
    Weighted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnComparison {
    pub simple_prediction: f64,
    pub weighted_prediction: f64,
    pub recommended: Recommendation,
}
