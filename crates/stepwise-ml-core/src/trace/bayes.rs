use serde::{Deserialize, Serialize};

use super::{ClassCount, ClassProbability, FeatureValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesPriors {
    pub class_counts: Vec<ClassCount>,
    pub priors: Vec<ClassProbability>,
    pub total_samples: usize,
}

/// `P(feature = value | class)` with add-one smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Likelihood {
    pub class: String,
    pub feature: String,
    pub value: String,
    pub count: usize,
    pub class_count: usize,
    pub distinct_values: usize,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesLikelihoods {
    pub likelihoods: Vec<Likelihood>,
    pub smoothing: String,
}

/// One likelihood factor used for the query example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub feature: String,
    pub value: String,
    pub count: usize,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorTerm {
    pub class: String,
    pub prior: f64,
    pub factors: Vec<Factor>,
    pub unnormalized: f64,
    /// `P(c) × P(f₁=v₁|c) × …` with the numbers filled in.
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesPosteriors {
    pub example: Vec<FeatureValue>,
    pub terms: Vec<PosteriorTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesNormalization {
    pub evidence: f64,
    pub posteriors: Vec<ClassProbability>,
}
