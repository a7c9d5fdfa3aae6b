use stepwise_ml_core::dataset::first_seen;
use stepwise_ml_core::trace::{
    ClassCount, EntropyMulticlass, FeatureGain, GainFeatureBreakdown, Outcome, Partition,
    ProbabilityTerm, SplitChooseFeature,
};
use stepwise_ml_core::{
    Algorithm, Dataset, Engine, Parameters, Step, StepDetail, Summary, TraceBuilder, TraceDocument,
    TraceError, TraceResult,
};
use stepwise_ml_stats::{entropy, entropy_term, finite};
use tracing::{debug, info, warn};

/// Information-gain analysis of the root split of an ID3 tree.
///
/// Only the root is examined: every candidate feature is scored and the one
/// with the highest gain is reported. No subtree is grown.
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3;

impl Id3 {
    pub fn new() -> Self {
        Id3
    }

    fn target(dataset: &Dataset, params: &Parameters) -> TraceResult<String> {
        match &params.target {
            Some(t) => {
                dataset.column_index(t)?;
                Ok(t.clone())
            }
            None => dataset.columns().last().cloned().ok_or_else(|| TraceError::ColumnNotFound {
                name: "<target>".into(),
                available: Vec::new(),
            }),
        }
    }

    /// Requested features as given, else every categorical column but the target.
    fn features(dataset: &Dataset, params: &Parameters, target: &str) -> TraceResult<Vec<String>> {
        if let Some(features) = params.requested_features() {
            for f in features {
                dataset.column_index(f)?;
            }
            return Ok(features.iter().filter(|f| *f != target).cloned().collect());
        }
        Ok(dataset
            .categorical_columns()
            .into_iter()
            .filter(|c| *c != target)
            .map(str::to_string)
            .collect())
    }
}

/// Gains closer than this are treated as tied.
pub const GAIN_TOLERANCE: f64 = 1e-12;

/// Candidates in descending gain. Each tied group (gains within
/// [`GAIN_TOLERANCE`] of the group's top gain) keeps input order, so the first
/// entry is the earliest feature whose gain reaches `max_gain − GAIN_TOLERANCE`.
fn rank_by_gain(candidates: Vec<FeatureGain>) -> Vec<FeatureGain> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| candidates[b].gain.total_cmp(&candidates[a].gain).then(a.cmp(&b)));

    let mut start = 0;
    while start < order.len() {
        let top = candidates[order[start]].gain;
        let mut end = start + 1;
        while end < order.len() && candidates[order[end]].gain >= top - GAIN_TOLERANCE {
            end += 1;
        }
        order[start..end].sort_unstable();
        start = end;
    }

    let mut slots: Vec<Option<FeatureGain>> = candidates.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

fn class_counts(classes: &[String], labels: &[&String]) -> Vec<ClassCount> {
    classes
        .iter()
        .map(|c| ClassCount {
            class: c.clone(),
            count: labels.iter().filter(|l| **l == c).count(),
        })
        .collect()
}

/// Partition the rows on `feature` and compute `Gain(S, feature)`.
pub fn gain_breakdown(
    dataset: &Dataset,
    feature: &str,
    target_labels: &[String],
    classes: &[String],
    base_entropy: f64,
) -> TraceResult<GainFeatureBreakdown> {
    let feature_labels = dataset.labels(feature)?;
    let total = feature_labels.len();
    let mut values = first_seen(&feature_labels);
    values.sort();

    let mut parts = Vec::with_capacity(values.len());
    let mut weighted_sum = 0.0;
    for value in &values {
        let subset: Vec<&String> = feature_labels
            .iter()
            .zip(target_labels)
            .filter(|(f, _)| *f == value)
            .map(|(_, t)| t)
            .collect();
        let size = subset.len();
        let counts = class_counts(classes, &subset);
        let p_terms = counts
            .iter()
            .filter(|cc| cc.count > 0)
            .map(|cc| {
                let p = cc.count as f64 / size as f64;
                ProbabilityTerm {
                    class: cc.class.clone(),
                    p,
                    term: entropy_term(p),
                }
            })
            .collect();
        let raw: Vec<usize> = counts.iter().map(|cc| cc.count).collect();
        let h = entropy(&raw, size);
        let weight = size as f64 / total as f64;
        weighted_sum += weight * h;
        parts.push(Partition {
            value: value.clone(),
            size,
            weight,
            class_counts: counts,
            p_terms,
            entropy: h,
        });
    }

    let gain = finite("information gain", (base_entropy - weighted_sum).max(0.0))?;
    Ok(GainFeatureBreakdown {
        feature: feature.to_string(),
        values,
        base_entropy,
        total,
        parts,
        weighted_sum,
        gain,
    })
}

impl Engine for Id3 {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Id3
    }

    fn run(&self, dataset: &Dataset, params: &Parameters) -> TraceResult<TraceDocument> {
        let target = Self::target(dataset, params)?;
        let features = Self::features(dataset, params, &target)?;
        info!(algorithm = %self.algorithm(), rows = dataset.len(), %target, features = features.len(), "running engine");

        if dataset.is_empty() {
            return Err(TraceError::EmptyInput("dataset has no rows".into()));
        }
        if features.is_empty() {
            return Err(TraceError::DegenerateInput(format!(
                "no categorical feature columns to split on besides '{target}'"
            )));
        }

        let target_labels = dataset.labels(&target)?;
        let classes = first_seen(&target_labels);
        if classes.len() == 1 {
            warn!(class = %classes[0], "target has a single class; every gain is zero");
        }
        let n = target_labels.len();
        let all: Vec<&String> = target_labels.iter().collect();
        let counts = class_counts(&classes, &all);
        let raw: Vec<usize> = counts.iter().map(|cc| cc.count).collect();
        let base_entropy = entropy(&raw, n);

        let mut trace = TraceBuilder::new();
        trace.push(
            Step::new(
                "Calculate Entropy of Target",
                format!("Entropy of '{target}' over all {n} rows"),
                StepDetail::EntropyMulticlass(EntropyMulticlass {
                    counts: counts.clone(),
                    total: n,
                    entropy: base_entropy,
                }),
            )
            .formula("H(S) = -Σ p(c) × log₂(p(c))")
            .calculation(format!(
                "H(S) = {} = {:.4}",
                counts
                    .iter()
                    .filter(|cc| cc.count > 0)
                    .map(|cc| format!("-({}/{n})×log₂({}/{n})", cc.count, cc.count))
                    .collect::<Vec<_>>()
                    .join(" + "),
                base_entropy
            )),
        );

        let mut candidates = Vec::with_capacity(features.len());
        for feature in &features {
            let breakdown = gain_breakdown(dataset, feature, &target_labels, &classes, base_entropy)?;
            debug!(%feature, gain = breakdown.gain, "scored feature");
            let calculation = format!(
                "Gain = {:.4} - ({}) = {:.4}",
                base_entropy,
                breakdown
                    .parts
                    .iter()
                    .map(|p| format!("{}/{}×{:.4}", p.size, n, p.entropy))
                    .collect::<Vec<_>>()
                    .join(" + "),
                breakdown.gain
            );
            candidates.push(FeatureGain {
                feature: feature.clone(),
                gain: breakdown.gain,
            });
            trace.push(
                Step::new(
                    format!("Information Gain for '{feature}'"),
                    format!("Partition rows by '{feature}' and measure the entropy left in each partition"),
                    StepDetail::GainFeatureBreakdown(breakdown),
                )
                .formula("Gain(S, A) = H(S) - Σ (|Sᵥ|/|S|) × H(Sᵥ)")
                .calculation(calculation),
            );
        }

        let candidates = rank_by_gain(candidates);
        let best = candidates[0].clone();
        trace.push(
            Step::new(
                "Choose Best Split Feature",
                "Select the feature with the highest information gain as the root split",
                StepDetail::SplitChooseFeature(SplitChooseFeature {
                    candidates: candidates.clone(),
                    best_feature: best.feature.clone(),
                    best_gain: best.gain,
                }),
            )
            .formula("A* = argmax_A Gain(S, A)")
            .calculation(
                candidates
                    .iter()
                    .map(|c| format!("Gain({}) = {:.4}", c.feature, c.gain))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        );

        info!(best_feature = %best.feature, best_gain = best.gain, "id3 finished");
        Ok(trace
            .finish(Summary {
                algorithm: self.algorithm(),
                dataset_size: n,
                features_used: features,
                target,
                outcome: Outcome::Split {
                    best_feature: best.feature,
                    best_gain: best.gain,
                    classes,
                },
            })
            .with_preview(dataset.preview(params.preview_rows())))
    }
}
