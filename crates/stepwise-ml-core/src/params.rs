use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TraceError, TraceResult};
use crate::value::Value;

/// Default hyperparameters and presentation limits.
pub mod defaults {
    pub const KNN_CLASSIFICATION_K: i64 = 5;
    pub const KNN_REGRESSION_K: i64 = 3;
    pub const SVR_C: f64 = 1.0;
    pub const SVR_EPSILON: f64 = 0.1;
    pub const PREVIEW_ROWS: usize = 10;
    /// Added to neighbor distances before inverting them into weights.
    pub const DISTANCE_EPSILON: f64 = 1e-9;
}

/// A query row: feature name to value.
pub type Example = BTreeMap<String, Value>;

/// Per-request parameter object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub target: Option<String>,
    /// Single feature column for the one-feature regressors.
    pub feature: Option<String>,
    pub features: Option<Vec<String>>,
    #[serde(alias = "test_point")]
    pub example: Option<Example>,
    pub k: Option<i64>,
    #[serde(rename = "C", alias = "c")]
    pub c: Option<f64>,
    pub epsilon: Option<f64>,
    pub preview_rows: Option<usize>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> TraceResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(|e| TraceError::InvalidParameters(e.to_string()))
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    pub fn with_features<S: Into<String>>(mut self, features: impl IntoIterator<Item = S>) -> Self {
        self.features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_example<K, V>(mut self, example: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.example = Some(
            example
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_k(mut self, k: i64) -> Self {
        self.k = Some(k);
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = Some(c);
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// The query example, treating `{}` as absent.
    pub fn query(&self) -> Option<&Example> {
        self.example.as_ref().filter(|e| !e.is_empty())
    }

    /// Requested features, treating `[]` as absent.
    pub fn requested_features(&self) -> Option<&[String]> {
        self.features.as_deref().filter(|f| !f.is_empty())
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows.unwrap_or(defaults::PREVIEW_ROWS)
    }
}
