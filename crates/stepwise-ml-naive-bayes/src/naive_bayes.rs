use stepwise_ml_core::columns::{classification_target, features_or_rest};
use stepwise_ml_core::trace::{
    BayesLikelihoods, BayesNormalization, BayesPosteriors, BayesPriors, ClassCount, ClassPrediction,
    ClassProbability, Factor, FeatureValue, Likelihood, Outcome, PosteriorTerm,
};
use stepwise_ml_core::{
    Algorithm, Dataset, Engine, Parameters, Step, StepDetail, Summary, TraceBuilder, TraceDocument,
    TraceError, TraceResult, Value,
};
use stepwise_ml_stats::finite;
use tracing::{debug, info, warn};

/// Categorical Naive Bayes with add-one (Laplace) smoothing.
///
/// `P(f=v | c) = (count(f=v, c) + 1) / (count(c) + |values(f)|)`
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveBayes;

/// Training counts for one categorical feature.
struct FeatureCounts {
    name: String,
    /// Distinct values, first-seen order.
    domain: Vec<String>,
    /// Label of this feature for each row.
    labels: Vec<String>,
}

impl FeatureCounts {
    fn count(&self, value: &str, class_rows: &[usize]) -> usize {
        class_rows.iter().filter(|&&i| self.labels[i] == value).count()
    }

    fn likelihood(&self, value: &str, class_rows: &[usize]) -> (usize, f64) {
        let count = self.count(value, class_rows);
        let p = (count as f64 + 1.0) / (class_rows.len() + self.domain.len()) as f64;
        (count, p)
    }
}

impl NaiveBayes {
    pub fn new() -> Self {
        NaiveBayes
    }

    /// The query row: the caller's example, or the mode of every feature
    /// when no example was given at all.
    fn query(dataset: &Dataset, params: &Parameters, features: &[String]) -> TraceResult<Vec<(String, Value)>> {
        match params.query() {
            Some(example) => features
                .iter()
                .map(|f| {
                    example
                        .get(f)
                        .cloned()
                        .map(|v| (f.clone(), v))
                        .ok_or_else(|| TraceError::MissingFeatureValue(f.clone()))
                })
                .collect(),
            None => features
                .iter()
                .map(|f| Ok((f.clone(), dataset.mode(f)?)))
                .collect(),
        }
    }
}

impl Engine for NaiveBayes {
    fn algorithm(&self) -> Algorithm {
        Algorithm::NaiveBayes
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

        let query = Self::query(dataset, params, &features)?;
        let target_labels = dataset.labels(&target)?;
        let classes = dataset.distinct_labels(&target)?;
        if classes.len() == 1 {
            warn!(class = %classes[0], "target has a single class");
        }
        let class_rows: Vec<Vec<usize>> = classes
            .iter()
            .map(|c| (0..n).filter(|&i| target_labels[i] == *c).collect())
            .collect();

        let counts: Vec<FeatureCounts> = features
            .iter()
            .map(|f| {
                Ok(FeatureCounts {
                    name: f.clone(),
                    domain: dataset.distinct_labels(f)?,
                    labels: dataset.labels(f)?,
                })
            })
            .collect::<TraceResult<_>>()?;

        let mut trace = TraceBuilder::new();

        // Priors
        let class_counts: Vec<ClassCount> = classes
            .iter()
            .zip(&class_rows)
            .map(|(c, rows)| ClassCount { class: c.clone(), count: rows.len() })
            .collect();
        let priors: Vec<f64> = class_rows.iter().map(|r| r.len() as f64 / n as f64).collect();
        trace.push(
            Step::new(
                "Calculate Prior Probabilities",
                "Calculate P(Class) for each class based on training data",
                StepDetail::BayesPriors(BayesPriors {
                    class_counts: class_counts.clone(),
                    priors: with_classes(&classes, &priors),
                    total_samples: n,
                }),
            )
            .formula("P(Class) = count(Class) / total_samples")
            .calculation(
                class_counts
                    .iter()
                    .zip(&priors)
                    .map(|(cc, p)| format!("P({}) = {}/{} = {:.4}", cc.class, cc.count, n, p))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        );

        // Likelihood table
        let mut likelihoods = Vec::new();
        for fc in &counts {
            for (class, rows) in classes.iter().zip(&class_rows) {
                for value in &fc.domain {
                    let (count, probability) = fc.likelihood(value, rows);
                    likelihoods.push(Likelihood {
                        class: class.clone(),
                        feature: fc.name.clone(),
                        value: value.clone(),
                        count,
                        class_count: rows.len(),
                        distinct_values: fc.domain.len(),
                        probability,
                    });
                }
            }
        }
        trace.push(
            Step::new(
                "Calculate Conditional Probabilities (Likelihoods)",
                "Calculate P(Feature=value|Class) for each feature value and class",
                StepDetail::BayesLikelihoods(BayesLikelihoods {
                    likelihoods,
                    smoothing: "Laplace (+1) smoothing keeps unseen feature values from zeroing a class".into(),
                }),
            )
            .formula("P(Feature=value|Class) = (count(Feature=value, Class) + 1) / (count(Class) + unique_values)"),
        );

        // Unnormalized posteriors
        let mut terms = Vec::with_capacity(classes.len());
        for ((class, rows), prior) in classes.iter().zip(&class_rows).zip(&priors) {
            let mut unnormalized = *prior;
            let mut parts = vec![format!("P({class}) = {prior:.4}")];
            let mut factors = Vec::with_capacity(counts.len());
            for (fc, (_, value)) in counts.iter().zip(&query) {
                let label = value.label();
                if !fc.domain.contains(&label) {
                    debug!(feature = %fc.name, value = %label, "example value unseen in training data");
                }
                let (count, probability) = fc.likelihood(&label, rows);
                unnormalized *= probability;
                parts.push(format!("P({}={}|{}) = {:.4}", fc.name, label, class, probability));
                factors.push(Factor {
                    feature: fc.name.clone(),
                    value: label,
                    count,
                    probability,
                });
            }
            terms.push(PosteriorTerm {
                class: class.clone(),
                prior: *prior,
                factors,
                unnormalized: finite("unnormalized posterior", unnormalized)?,
                expression: parts.join(" × "),
            });
        }
        let unnormalized: Vec<f64> = terms.iter().map(|t| t.unnormalized).collect();
        trace.push(
            Step::new(
                "Calculate Unnormalized Posteriors",
                "For the test example, multiply prior by all likelihoods",
                StepDetail::BayesPosteriors(BayesPosteriors {
                    example: query
                        .iter()
                        .map(|(f, v)| FeatureValue { feature: f.clone(), value: v.clone() })
                        .collect(),
                    terms: terms.clone(),
                }),
            )
            .formula("P(Class|X) ∝ P(Class) × ∏P(Feature_i|Class)")
            .calculation(
                terms
                    .iter()
                    .map(|t| format!("{} = {:.6}", t.expression, t.unnormalized))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        );

        // Evidence and normalization
        let evidence: f64 = unnormalized.iter().sum();
        let posteriors = normalize(&terms, evidence)?;
        trace.push(
            Step::new(
                "Normalize Posterior Probabilities",
                "Divide each unnormalized posterior by the evidence (sum of all unnormalized posteriors)",
                StepDetail::BayesNormalization(BayesNormalization {
                    evidence,
                    posteriors: with_classes(&classes, &posteriors),
                }),
            )
            .formula("P(Class|X) = P(Class|X)_unnormalized / Evidence")
            .calculation(format!(
                "Evidence = {} = {:.6}",
                unnormalized.iter().map(|u| format!("{u:.6}")).collect::<Vec<_>>().join(" + "),
                evidence
            )),
        );

        // Prediction: first class wins ties.
        let mut best = 0;
        for (i, p) in posteriors.iter().enumerate() {
            if *p > posteriors[best] {
                best = i;
            }
        }
        let predicted = classes[best].clone();
        let confidence = posteriors[best];
        trace.push(
            Step::new(
                "Make Final Prediction",
                "Choose the class with the highest posterior probability",
                StepDetail::ClassPrediction(ClassPrediction {
                    predicted_class: predicted.clone(),
                    confidence,
                    probabilities: with_classes(&classes, &posteriors),
                    interpretation: format!(
                        "Predicted class '{predicted}' with {:.2}% posterior probability",
                        confidence * 100.0
                    ),
                }),
            )
            .formula("ŷ = argmax_c P(c|X)"),
        );

        info!(prediction = %predicted, confidence, "naive bayes finished");
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

/// `uᵢ / Σu`. When the product of many small likelihoods underflows the
/// evidence to zero, normalize in log space instead.
fn normalize(terms: &[PosteriorTerm], evidence: f64) -> TraceResult<Vec<f64>> {
    if evidence > 0.0 && evidence.is_normal() {
        return terms
            .iter()
            .map(|t| finite("normalized posterior", t.unnormalized / evidence))
            .collect();
    }
    warn!(evidence, "evidence underflowed; normalizing in log space");
    let logs: Vec<f64> = terms
        .iter()
        .map(|t| t.prior.ln() + t.factors.iter().map(|f| f.probability.ln()).sum::<f64>())
        .collect();
    let max = logs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let total: f64 = logs.iter().map(|l| (l - max).exp()).sum();
    logs.iter()
        .map(|l| finite("normalized posterior", (l - max).exp() / total))
        .collect()
}

fn with_classes(classes: &[String], values: &[f64]) -> Vec<ClassProbability> {
    classes
        .iter()
        .zip(values)
        .map(|(c, &p)| ClassProbability { class: c.clone(), probability: p })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const PLAY_TENNIS: &str = "Sunny Hot High Weak No
Sunny Hot High Strong No
Overcast Hot High Weak Yes
Rain Mild High Weak Yes
Rain Cool Normal Weak Yes
Rain Cool Normal Strong No
Overcast Cool Normal Strong Yes
Sunny Mild High Weak No
Sunny Cool Normal Weak Yes
Rain Mild Normal Weak Yes
Sunny Mild Normal Strong Yes
Overcast Mild High Strong Yes
Overcast Hot Normal Weak Yes
Rain Mild High Strong No";

    fn play_tennis() -> Dataset {
        let rows = PLAY_TENNIS
            .lines()
            .map(|l| l.split_whitespace().map(Value::from).collect())
            .collect();
        let columns = ["outlook", "temperature", "humidity", "wind", "play"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Dataset::new(columns, rows).unwrap()
    }

    fn sunny_cool() -> Parameters {
        Parameters::new().with_example([
            ("outlook", "Sunny"),
            ("temperature", "Cool"),
            ("humidity", "High"),
            ("wind", "Strong"),
        ])
    }

    fn prediction(doc: &TraceDocument) -> (String, f64) {
        match &doc.summary.outcome {
            Outcome::Classification { prediction, confidence, .. } => (prediction.clone(), *confidence),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_classic_example() {
        let doc = NaiveBayes.run(&play_tennis(), &sunny_cool()).unwrap();
        assert_eq!(doc.steps.len(), 5);
        assert_eq!(doc.summary.target, "play");
        let (class, confidence) = prediction(&doc);
        assert_eq!(class, "No");
        assert_abs_diff_eq!(confidence, 0.720_066_650_797_429_2, epsilon = 1e-12);

        match &doc.steps[2].detail {
            StepDetail::BayesPosteriors(p) => {
                assert_abs_diff_eq!(p.terms[0].unnormalized, 0.018_221_574_344_023_325, epsilon = 1e-15);
                assert_abs_diff_eq!(p.terms[1].unnormalized, 0.007_083_825_265_643_448, epsilon = 1e-15);
                assert_eq!(p.terms[0].factors.len(), 4);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(doc.dataset_preview.len(), 10);
    }

    #[test]
    fn test_priors_and_likelihood_table() {
        let doc = NaiveBayes.run(&play_tennis(), &sunny_cool()).unwrap();
        match &doc.steps[0].detail {
            StepDetail::BayesPriors(p) => {
                assert_eq!(p.class_counts[0], ClassCount { class: "No".into(), count: 5 });
                assert_abs_diff_eq!(p.priors[1].probability, 9.0 / 14.0);
            }
            other => panic!("unexpected step {other:?}"),
        }
        match &doc.steps[1].detail {
            StepDetail::BayesLikelihoods(l) => {
                // 2 classes × (3 + 3 + 2 + 2) feature values
                assert_eq!(l.likelihoods.len(), 20);
                let e = &l.likelihoods[0];
                assert_eq!((e.class.as_str(), e.feature.as_str(), e.value.as_str()), ("No", "outlook", "Sunny"));
                assert_abs_diff_eq!(e.probability, 4.0 / 8.0);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_posteriors_sum_to_one() {
        for outlook in ["Sunny", "Overcast", "Rain", "Snow"] {
            let params = Parameters::new().with_example([
                ("outlook", outlook),
                ("temperature", "Mild"),
                ("humidity", "Normal"),
                ("wind", "Weak"),
            ]);
            let doc = NaiveBayes.run(&play_tennis(), &params).unwrap();
            match &doc.steps[3].detail {
                StepDetail::BayesNormalization(n) => {
                    let total: f64 = n.posteriors.iter().map(|p| p.probability).sum();
                    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
                }
                other => panic!("unexpected step {other:?}"),
            }
        }
    }

    #[test]
    fn test_single_class_target() {
        let ds = Dataset::from_json_records(
            r#"[{"color": "red", "label": "a"}, {"color": "blue", "label": "a"}]"#,
        )
        .unwrap();
        let params = Parameters::new().with_example([("color", "green")]);
        let doc = NaiveBayes.run(&ds, &params).unwrap();
        let (class, confidence) = prediction(&doc);
        assert_eq!(class, "a");
        assert_abs_diff_eq!(confidence, 1.0);
    }

    #[test]
    fn test_missing_example_value() {
        let params = Parameters::new().with_example([("outlook", "Sunny")]);
        assert_eq!(
            NaiveBayes.run(&play_tennis(), &params),
            Err(TraceError::MissingFeatureValue("temperature".into()))
        );
    }

    #[test]
    fn test_default_example_uses_modes() {
        let doc = NaiveBayes.run(&play_tennis(), &Parameters::new()).unwrap();
        match &doc.steps[2].detail {
            StepDetail::BayesPosteriors(p) => {
                let values: Vec<String> = p.example.iter().map(|fv| fv.value.label()).collect();
                assert_eq!(values, vec!["Sunny", "Mild", "High", "Weak"]);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_deterministic() {
        let a = NaiveBayes.run(&play_tennis(), &sunny_cool()).unwrap();
        let b = NaiveBayes.run(&play_tennis(), &sunny_cool()).unwrap();
        assert_eq!(a, b);
    }
}
