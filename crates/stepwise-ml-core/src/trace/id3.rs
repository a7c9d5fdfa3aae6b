use serde::{Deserialize, Serialize};

use super::ClassCount;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyMulticlass {
    pub counts: Vec<ClassCount>,
    pub total: usize,
    pub entropy: f64,
}

/// `p = |c| / |Sᵥ|` and its entropy contribution `−p·log₂p`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityTerm {
    pub class: String,
    pub p: f64,
    pub term: f64,
}

/// Rows sharing one value of the candidate feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub value: String,
    pub size: usize,
    pub weight: f64,
    pub class_counts: Vec<ClassCount>,
    pub p_terms: Vec<ProbabilityTerm>,
    pub entropy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainFeatureBreakdown {
    pub feature: String,
    pub values: Vec<String>,
    pub base_entropy: f64,
    pub total: usize,
    pub parts: Vec<Partition>,
    pub weighted_sum: f64,
    pub gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGain {
    pub feature: String,
    pub gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitChooseFeature {
    /// Ranked by gain, descending; equal gains keep input column order.
    pub candidates: Vec<FeatureGain>,
    pub best_feature: String,
    pub best_gain: f64,
}
