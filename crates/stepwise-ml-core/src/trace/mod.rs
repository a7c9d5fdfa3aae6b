//! Trace model: the ordered steps every engine emits, plus the final summary.
//!
//! A [`Step`] is a common envelope (number, title, description, formula) with a
//! typed payload ([`StepDetail`]) tagged by `formula_id`, so a renderer can
//! dispatch with one exhaustive match.

pub mod bayes;
pub mod id3;
pub mod knn;
pub mod regression;
pub mod summary;
pub mod svr;

use serde::{Deserialize, Serialize};

use crate::dataset::Record;
use crate::error::{TraceError, TraceResult};
use crate::value::Value;

pub use bayes::*;
pub use id3::*;
pub use knn::*;
pub use regression::*;
pub use summary::*;
pub use svr::*;

/// Number of rows of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCount {
    pub class: String,
    pub count: usize,
}

/// Probability attached to one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub class: String,
    pub probability: f64,
}

/// One feature of a query example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    pub feature: String,
    pub value: Value,
}

/// Final class decision, shared by Naive Bayes and KNN classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPrediction {
    pub predicted_class: String,
    pub confidence: f64,
    pub probabilities: Vec<ClassProbability>,
    pub interpretation: String,
}

/// Algorithm-specific payload of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "formula_id", rename_all = "snake_case")]
pub enum StepDetail {
    LinearMeans(LinearMeans),
    LinearSlope(LinearSlope),
    LinearIntercept(LinearIntercept),
    RegressionEquation(RegressionEquation),
    SamplePredictions(SamplePredictions),
    RSquared(RSquared),

    BayesPriors(BayesPriors),
    BayesLikelihoods(BayesLikelihoods),
    BayesPosteriors(BayesPosteriors),
    BayesNormalization(BayesNormalization),
    ClassPrediction(ClassPrediction),

    EntropyMulticlass(EntropyMulticlass),
    GainFeatureBreakdown(GainFeatureBreakdown),
    SplitChooseFeature(SplitChooseFeature),

    KnnConfiguration(KnnConfiguration),
    KnnPreprocessing(KnnPreprocessing),
    KnnNeighbors(KnnNeighbors),
    KnnVote(KnnVote),
    KnnAverage(KnnAverage),
    KnnWeightedAverage(KnnWeightedAverage),
    KnnComparison(KnnComparison),

    SvrHyperparameters(SvrHyperparameters),
    SvrStandardization(SvrStandardization),
    SvrObjective(SvrObjective),
    SvrSlope(SvrSlope),
    SvrIntercept(SvrIntercept),
    SvrSupportVectors(SvrSupportVectors),
}

/// One entry of a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based, assigned by [`TraceBuilder::push`].
    pub step_number: usize,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// The formula with this request's numbers substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation: Option<String>,
    #[serde(flatten)]
    pub detail: StepDetail,
}

impl Step {
    pub fn new(title: impl Into<String>, description: impl Into<String>, detail: StepDetail) -> Self {
        Step {
            step_number: 0,
            title: title.into(),
            description: description.into(),
            formula: None,
            calculation: None,
            detail,
        }
    }

    pub fn formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn calculation(mut self, calculation: impl Into<String>) -> Self {
        self.calculation = Some(calculation.into());
        self
    }
}

/// The document one engine invocation returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceDocument {
    pub steps: Vec<Step>,
    pub summary: Summary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chart_data: Vec<ChartPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dataset_preview: Vec<Record>,
}

impl TraceDocument {
    pub fn with_chart_data(mut self, chart_data: Vec<ChartPoint>) -> Self {
        self.chart_data = chart_data;
        self
    }

    pub fn with_preview(mut self, preview: Vec<Record>) -> Self {
        self.dataset_preview = preview;
        self
    }

    /// Check the canonical shape: at least one step, numbered `1..=n` in order.
    pub fn validate(&self) -> TraceResult<()> {
        if self.steps.is_empty() {
            return Err(TraceError::MalformedTrace("trace has no steps".into()));
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.step_number != i + 1 {
                return Err(TraceError::MalformedTrace(format!(
                    "step at position {} is numbered {}",
                    i + 1,
                    step.step_number
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> TraceResult<String> {
        self.validate()?;
        serde_json::to_string(self).map_err(|e| TraceError::MalformedTrace(e.to_string()))
    }
}

/// Accumulates steps in order and numbers them.
#[derive(Debug, Default)]
pub struct TraceBuilder {
    steps: Vec<Step>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut step: Step) -> usize {
        step.step_number = self.steps.len() + 1;
        self.steps.push(step);
        self.steps.len()
    }

    pub fn finish(self, summary: Summary) -> TraceDocument {
        TraceDocument {
            steps: self.steps,
            summary,
            chart_data: Vec::new(),
            dataset_preview: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;
    use crate::error::ErrorKind;

    fn summary() -> Summary {
        Summary {
            algorithm: Algorithm::Id3,
            dataset_size: 4,
            features_used: vec!["outlook".into()],
            target: "play".into(),
            outcome: Outcome::Split {
                best_feature: "outlook".into(),
                best_gain: 0.5,
                classes: vec!["yes".into(), "no".into()],
            },
        }
    }

    #[test]
    fn test_builder_numbers_steps() {
        let mut trace = TraceBuilder::new();
        for _ in 0..3 {
            trace.push(Step::new(
                "Entropy",
                "H(S)",
                StepDetail::EntropyMulticlass(EntropyMulticlass {
                    counts: vec![],
                    total: 0,
                    entropy: 0.0,
                }),
            ));
        }
        let doc = trace.finish(summary());
        let numbers: Vec<usize> = doc.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_gaps() {
        let mut trace = TraceBuilder::new();
        trace.push(Step::new(
            "Split",
            "choose",
            StepDetail::SplitChooseFeature(SplitChooseFeature {
                candidates: vec![],
                best_feature: "outlook".into(),
                best_gain: 0.0,
            }),
        ));
        let mut doc = trace.finish(summary());
        doc.steps[0].step_number = 2;
        let err = doc.validate().unwrap_err();
        assert_eq!(err, TraceError::MalformedTrace("step at position 1 is numbered 2".into()));
        assert_eq!(err.kind(), ErrorKind::Computation);
        assert_eq!(doc.to_json(), Err(err));
        doc.steps.clear();
        assert!(matches!(doc.validate(), Err(TraceError::MalformedTrace(_))));
    }

    #[test]
    fn test_step_json_shape() {
        let step = Step {
            step_number: 1,
            ..Step::new(
                "Entropy",
                "H(S)",
                StepDetail::EntropyMulticlass(EntropyMulticlass {
                    counts: vec![ClassCount { class: "yes".into(), count: 2 }],
                    total: 2,
                    entropy: 0.0,
                }),
            )
            .formula("H(S) = -Σ p log2 p")
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["formula_id"], "entropy_multiclass");
        assert_eq!(json["step_number"], 1);
        assert_eq!(json["counts"][0]["count"], 2);
        assert!(json.get("calculation").is_none());

        let back: Step = serde_json::from_value(json).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn test_document_json_round_trip() {
        let mut trace = TraceBuilder::new();
        trace.push(Step::new(
            "Split",
            "choose",
            StepDetail::SplitChooseFeature(SplitChooseFeature {
                candidates: vec![FeatureGain { feature: "outlook".into(), gain: 0.5 }],
                best_feature: "outlook".into(),
                best_gain: 0.5,
            }),
        ));
        let doc = trace.finish(summary());
        let json = doc.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["task"], "split");
        assert_eq!(value["summary"]["algorithm"], "id3");
        assert!(value.get("chart_data").is_none());
        let back: TraceDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
