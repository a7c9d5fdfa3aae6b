use stepwise_ml_core::columns::{classification_target, features_or_rest};
use stepwise_ml_core::params::defaults;
use stepwise_ml_core::trace::{
    ClassPrediction, ClassProbability, EncodedFeature, FeatureScaling, KnnConfiguration,
    KnnPreprocessing, KnnVote, Outcome, Scaling, VoteShare,
};
use stepwise_ml_core::{
    Algorithm, ColumnKind, Dataset, Engine, Parameters, Step, StepDetail, Summary, TraceBuilder,
    TraceDocument, TraceError, TraceResult, Value,
};
use stepwise_ml_preprocessing::{LabelEncoder, StandardScaler};
use tracing::{debug, info, warn};

use crate::knn::{configuration_step, nearest, neighbors_step, query_values, resolve_k};

/// Majority-vote KNN over z-score standardized features.
///
/// Categorical features are label-encoded (sorted categories) before
/// standardization, so every feature contributes on the same scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnnClassification;

impl KnnClassification {
    pub fn new() -> Self {
        KnnClassification
    }
}

/// Per-feature encoding of the training matrix.
enum Encoding {
    Numeric,
    Categorical(LabelEncoder),
}

impl Engine for KnnClassification {
    fn algorithm(&self) -> Algorithm {
        Algorithm::KnnClassification
    }

    fn run(&self, dataset: &Dataset, params: &Parameters) -> TraceResult<TraceDocument> {
        let target = classification_target(dataset, params)?;
        let features: Vec<String> = features_or_rest(dataset, params, &target)?
            .into_iter()
            .filter(|f| *f != target)
            .collect();
        info!(algorithm = %self.algorithm(), rows = dataset.len(), %target, "running engine");

        let n = dataset.len();
        if n == 0 {
            return Err(TraceError::EmptyInput("dataset has no rows".into()));
        }
        if features.is_empty() {
            return Err(TraceError::DegenerateInput("no feature columns besides the target".into()));
        }
        let k = resolve_k(params.k, defaults::KNN_CLASSIFICATION_K, n)?;
        let query = query_values(dataset, params, &features)?;

        // Training matrix, column by column.
        let mut encodings = Vec::with_capacity(features.len());
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(features.len());
        let mut encoded = Vec::new();
        for f in &features {
            match dataset.column_kind(f)? {
                ColumnKind::Numeric => {
                    columns.push(dataset.numeric_column(f)?);
                    encodings.push(Encoding::Numeric);
                }
                ColumnKind::Categorical => {
                    let labels = dataset.labels(f)?;
                    let mut encoder = LabelEncoder::new();
                    encoder.fit(&labels);
                    columns.push(
                        labels
                            .iter()
                            .map(|l| encoder.encode(l).unwrap_or(0) as f64)
                            .collect(),
                    );
                    encoded.push(EncodedFeature {
                        feature: f.clone(),
                        categories: encoder.classes.clone(),
                    });
                    encodings.push(Encoding::Categorical(encoder));
                }
            }
        }
        let rows: Vec<Vec<f64>> = (0..n).map(|i| columns.iter().map(|c| c[i]).collect()).collect();

        let mut notes = Vec::new();
        let mut raw_query = Vec::with_capacity(features.len());
        for (fv, encoding) in query.iter().zip(&encodings) {
            let x = match encoding {
                Encoding::Numeric => fv.value.coerce_f64().ok_or_else(|| {
                    TraceError::InvalidParameters(format!(
                        "example value '{}' for numeric feature '{}' is not a number",
                        fv.value, fv.feature
                    ))
                })?,
                Encoding::Categorical(encoder) => match encoder.encode(&fv.value.label()) {
                    Some(code) => code as f64,
                    None => {
                        warn!(feature = %fv.feature, value = %fv.value, "unseen category encoded as 0");
                        notes.push(format!(
                            "'{}' was never seen in '{}' and is encoded as 0",
                            fv.value, fv.feature
                        ));
                        0.0
                    }
                },
            };
            raw_query.push(x);
        }

        let mut scaler = StandardScaler::new();
        scaler.fit(&rows)?;
        let query_vector = scaler.transform_row(&raw_query)?;
        let scalers: Vec<FeatureScaling> = features
            .iter()
            .enumerate()
            .map(|(j, f)| {
                if scaler.std[j] < f64::EPSILON {
                    notes.push(format!("'{f}' is constant; its scale is fixed at 1"));
                }
                FeatureScaling {
                    feature: f.clone(),
                    mean: scaler.mean[j],
                    std: scaler.std[j],
                }
            })
            .collect();
        debug!(?query_vector, "standardized query");

        let targets: Vec<Value> = dataset.column(&target)?.into_iter().cloned().collect();
        let target_labels = dataset.labels(&target)?;
        let mut class_encoder = LabelEncoder::new();
        class_encoder.fit(&target_labels);
        let classes = class_encoder.classes.clone();

        let all = rows
            .iter()
            .map(|r| scaler.distance(r, &raw_query))
            .collect::<TraceResult<Vec<f64>>>()?;
        let near = nearest(&all, k);

        let mut trace = TraceBuilder::new();
        trace.push(configuration_step(KnnConfiguration {
            k,
            features: features.clone(),
            target: target.clone(),
            classes: Some(classes.clone()),
            dataset_size: n,
            query: query.clone(),
        }));
        trace.push(
            Step::new(
                "Standardize Features",
                "Scale every feature to zero mean and unit variance so no feature dominates the distance",
                StepDetail::KnnPreprocessing(KnnPreprocessing {
                    scaling: Scaling::ZScore,
                    encoded,
                    scalers: scalers.clone(),
                    query_vector: query_vector.clone(),
                    notes,
                }),
            )
            .formula("z = (x - μ) / σ")
            .calculation(
                scalers
                    .iter()
                    .zip(&raw_query)
                    .zip(&query_vector)
                    .map(|((s, x), z)| format!("{}: ({:.3} - {:.3}) / {:.3} = {:.3}", s.feature, x, s.mean, s.std, z))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        );
        trace.push(neighbors_step(&all, &targets, &near));

        // Vote over every class; the first (smallest) class wins ties.
        let votes: Vec<VoteShare> = classes
            .iter()
            .map(|c| {
                let votes = near.iter().filter(|r| target_labels[r.index] == *c).count();
                VoteShare {
                    class: c.clone(),
                    votes,
                    percentage: votes as f64 / k as f64 * 100.0,
                }
            })
            .collect();
        let mut best = 0;
        for (i, v) in votes.iter().enumerate() {
            if v.votes > votes[best].votes {
                best = i;
            }
        }
        let predicted = votes[best].class.clone();
        let winner_votes = votes[best].votes;
        trace.push(
            Step::new(
                "Count Votes",
                "Count the class votes from the k nearest neighbors",
                StepDetail::KnnVote(KnnVote {
                    votes: votes.clone(),
                    total_votes: k,
                    majority_class: predicted.clone(),
                }),
            )
            .formula("ŷ = mode(y₁, ..., yₖ)")
            .calculation(
                votes
                    .iter()
                    .map(|v| format!("{}: {}/{} ({:.1}%)", v.class, v.votes, k, v.percentage))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        );

        let confidence = winner_votes as f64 / k as f64;
        let probabilities = votes
            .iter()
            .map(|v| ClassProbability {
                class: v.class.clone(),
                probability: v.votes as f64 / k as f64,
            })
            .collect();
        trace.push(
            Step::new(
                "Final Prediction",
                "The class with the most votes becomes the prediction",
                StepDetail::ClassPrediction(ClassPrediction {
                    predicted_class: predicted.clone(),
                    confidence,
                    probabilities,
                    interpretation: format!(
                        "Based on the {k} nearest neighbors, the predicted class is '{predicted}' with {winner_votes} out of {k} votes."
                    ),
                }),
            )
            .formula("P(c) = votes(c) / k"),
        );

        info!(prediction = %predicted, confidence, k, "knn classification finished");
        Ok(trace
            .finish(Summary {
                algorithm: self.algorithm(),
                dataset_size: n,
                features_used: features,
                target,
                outcome: Outcome::Classification {
                    prediction: predicted,
                    confidence,
                    classes,
                },
            })
            .with_preview(dataset.preview(params.preview_rows())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn clusters() -> Dataset {
        Dataset::from_json_records(
            r#"[
                {"x1": 1, "x2": 1, "label": "A"},
                {"x1": 1, "x2": 2, "label": "A"},
                {"x1": 2, "x2": 1, "label": "A"},
                {"x1": 8, "x2": 8, "label": "B"},
                {"x1": 8, "x2": 9, "label": "B"},
                {"x1": 9, "x2": 8, "label": "B"}
            ]"#,
        )
        .unwrap()
    }

    fn outcome(doc: &TraceDocument) -> (String, f64) {
        match &doc.summary.outcome {
            Outcome::Classification { prediction, confidence, .. } => (prediction.clone(), *confidence),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_clear_majority() {
        let p = Parameters::new().with_k(3).with_example([("x1", 1.5), ("x2", 1.5)]);
        let doc = KnnClassification.run(&clusters(), &p).unwrap();
        assert_eq!(doc.steps.len(), 5);
        assert!(doc.validate().is_ok());
        assert_eq!(outcome(&doc), ("A".to_string(), 1.0));
        assert_eq!(doc.summary.target, "label");
        match &doc.steps[3].detail {
            StepDetail::KnnVote(v) => {
                assert_eq!(v.votes.len(), 2);
                assert_eq!(v.votes[0].votes, 3);
                assert_eq!(v.votes[1].votes, 0);
                assert_abs_diff_eq!(v.votes[0].percentage, 100.0);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_k1_exact_match() {
        let p = Parameters::new().with_k(1).with_example([("x1", 8.0), ("x2", 9.0)]);
        let doc = KnnClassification.run(&clusters(), &p).unwrap();
        match &doc.steps[2].detail {
            StepDetail::KnnNeighbors(nb) => {
                assert_eq!(nb.distances.len(), 6);
                assert_eq!(nb.neighbors.len(), 1);
                assert_eq!(nb.neighbors[0].index, 4);
                assert_abs_diff_eq!(nb.neighbors[0].distance, 0.0, epsilon = 1e-12);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(outcome(&doc), ("B".to_string(), 1.0));
    }

    #[test]
    fn test_standardization_reported() {
        let p = Parameters::new().with_k(3).with_example([("x1", 5.0), ("x2", 5.0)]);
        let doc = KnnClassification.run(&clusters(), &p).unwrap();
        match &doc.steps[1].detail {
            StepDetail::KnnPreprocessing(pre) => {
                assert_eq!(pre.scaling, Scaling::ZScore);
                assert_abs_diff_eq!(pre.scalers[0].mean, 29.0 / 6.0, epsilon = 1e-12);
                assert_abs_diff_eq!(pre.query_vector[0], (5.0 - 29.0 / 6.0) / pre.scalers[0].std, epsilon = 1e-12);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_vote_tie_goes_to_smallest_class() {
        let ds = Dataset::from_json_records(r#"[{"x": 0, "class": "b"}, {"x": 2, "class": "a"}]"#).unwrap();
        let p = Parameters::new().with_k(2).with_example([("x", 1.0)]);
        let doc = KnnClassification.run(&ds, &p).unwrap();
        let (class, confidence) = outcome(&doc);
        assert_eq!(class, "a");
        assert_abs_diff_eq!(confidence, 0.5);
    }

    #[test]
    fn test_equidistant_rows_keep_row_order() {
        for (q, offset, far) in [(1.0, 1.0, 151.0), (1.0, 1.0, 100.0), (3.0, 2.0, 40.0), (10.0, 7.0, 999.0)] {
            let ds = Dataset::new(
                vec!["x".into(), "class".into()],
                vec![
                    vec![Value::Number(q + offset), Value::from("hi")],
                    vec![Value::Number(q - offset), Value::from("lo")],
                    vec![Value::Number(far), Value::from("far")],
                ],
            )
            .unwrap();
            let p = Parameters::new().with_k(1).with_example([("x", q)]);
            let doc = KnnClassification.run(&ds, &p).unwrap();
            match &doc.steps[2].detail {
                StepDetail::KnnNeighbors(nb) => {
                    assert_eq!(nb.distances[0].distance, nb.distances[1].distance);
                    assert_eq!(nb.neighbors[0].index, 0);
                }
                other => panic!("unexpected step {other:?}"),
            }
            assert_eq!(outcome(&doc).0, "hi", "query {q}, offset {offset}, far row {far}");
        }
    }

    #[test]
    fn test_categorical_features() {
        let ds = Dataset::from_json_records(
            r#"[
                {"color": "red", "size": 1, "type": "small"},
                {"color": "red", "size": 2, "type": "small"},
                {"color": "blue", "size": 9, "type": "big"},
                {"color": "green", "size": 8, "type": "big"}
            ]"#,
        )
        .unwrap();
        let p = Parameters::new().with_k(1).with_example([
            ("color", Value::from("purple")),
            ("size", Value::Number(9.0)),
        ]);
        let doc = KnnClassification.run(&ds, &p).unwrap();
        match &doc.steps[1].detail {
            StepDetail::KnnPreprocessing(pre) => {
                assert_eq!(pre.encoded[0].categories, vec!["blue", "green", "red"]);
                assert_eq!(pre.notes.len(), 1);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(outcome(&doc).0, "big");
    }

    #[test]
    fn test_invalid_k() {
        for k in [0, -1, 7] {
            let p = Parameters::new().with_k(k);
            assert_eq!(
                KnnClassification.run(&clusters(), &p),
                Err(TraceError::InvalidK { k, n_rows: 6 })
            );
        }
    }

    #[test]
    fn test_default_query_and_k() {
        let doc = KnnClassification.run(&clusters(), &Parameters::new()).unwrap();
        match &doc.steps[0].detail {
            StepDetail::KnnConfiguration(c) => {
                assert_eq!(c.k, 5);
                assert_eq!(c.query[0].value, Value::Number(29.0 / 6.0));
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(doc.dataset_preview.len(), 6);
    }
}
