use stepwise_ml_core::columns::{regression_target, require_numeric};
use stepwise_ml_core::params::defaults;
use stepwise_ml_core::trace::{
    ChartPoint, KnnAverage, KnnComparison, KnnConfiguration, KnnPreprocessing, KnnWeightedAverage,
    NeighborWeight, Outcome, Recommendation, Scaling,
};
use stepwise_ml_core::{
    Algorithm, Dataset, Engine, Parameters, Step, StepDetail, Summary, TraceBuilder, TraceDocument,
    TraceError, TraceResult, Value,
};
use stepwise_ml_stats::{finite, mean, weighted_average};
use tracing::{debug, info};

use crate::knn::{configuration_step, distances, nearest, neighbors_step, query_values, resolve_k, RankedRow};

/// Weighted and simple predictions further apart than this favour the weighted one.
pub const RECOMMENDATION_THRESHOLD: f64 = 0.01;

/// KNN regression in the raw feature space, reporting both the simple mean
/// of the neighbors and the inverse-distance weighted mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnnRegression;

/// Inverse-distance weights `1 / (d + ε)` of the chosen neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEstimate {
    pub weights: Vec<f64>,
    pub total_weight: f64,
    pub prediction: f64,
    /// Every neighbor sat at the same distance, so the estimate is the plain mean.
    pub fallback_to_simple: bool,
}

impl KnnRegression {
    pub fn new() -> Self {
        KnnRegression
    }

    /// Requested features, else the first two numeric columns that are not the target.
    fn features(dataset: &Dataset, params: &Parameters, target: &str) -> TraceResult<Vec<String>> {
        let features: Vec<String> = match params.requested_features() {
            Some(f) => f.iter().filter(|f| *f != target).cloned().collect(),
            None => dataset
                .numeric_columns()
                .into_iter()
                .filter(|c| *c != target)
                .take(2)
                .map(str::to_string)
                .collect(),
        };
        if features.is_empty() {
            return Err(TraceError::DegenerateInput(
                "no numeric feature columns besides the target".into(),
            ));
        }
        for f in &features {
            require_numeric(dataset, f)?;
        }
        Ok(features)
    }

    pub fn weighted(neighbors: &[RankedRow], values: &[f64], simple: f64) -> TraceResult<WeightedEstimate> {
        let weights: Vec<f64> = neighbors
            .iter()
            .map(|r| 1.0 / (r.distance + defaults::DISTANCE_EPSILON))
            .collect();
        let total_weight: f64 = weights.iter().sum();
        let first = neighbors.first().map(|r| r.distance);
        let fallback_to_simple = neighbors.iter().all(|r| Some(r.distance) == first);
        let prediction = if fallback_to_simple {
            simple
        } else {
            weighted_average(values, &weights)?
        };
        Ok(WeightedEstimate {
            weights,
            total_weight,
            prediction: finite("weighted prediction", prediction)?,
            fallback_to_simple,
        })
    }
}

impl Engine for KnnRegression {
    fn algorithm(&self) -> Algorithm {
        Algorithm::KnnRegression
    }

    fn run(&self, dataset: &Dataset, params: &Parameters) -> TraceResult<TraceDocument> {
        let target = regression_target(dataset, params)?;
        let features = Self::features(dataset, params, &target)?;
        info!(algorithm = %self.algorithm(), rows = dataset.len(), %target, "running engine");

        let n = dataset.len();
        if n == 0 {
            return Err(TraceError::EmptyInput("dataset has no rows".into()));
        }
        let k = resolve_k(params.k, defaults::KNN_REGRESSION_K, n)?;
        let query = query_values(dataset, params, &features)?;
        let query_vector = query
            .iter()
            .map(|fv| {
                fv.value.coerce_f64().ok_or_else(|| {
                    TraceError::InvalidParameters(format!(
                        "example value '{}' for numeric feature '{}' is not a number",
                        fv.value, fv.feature
                    ))
                })
            })
            .collect::<TraceResult<Vec<f64>>>()?;

        let columns = features
            .iter()
            .map(|f| dataset.numeric_column(f))
            .collect::<TraceResult<Vec<_>>>()?;
        let rows: Vec<Vec<f64>> = (0..n).map(|i| columns.iter().map(|c| c[i]).collect()).collect();
        let ys = dataset.numeric_column(&target)?;
        let targets: Vec<Value> = ys.iter().map(|&y| Value::Number(y)).collect();

        let all = distances(&rows, &query_vector)?;
        let near = nearest(&all, k);
        let neighbor_values: Vec<f64> = near.iter().map(|r| ys[r.index]).collect();
        let simple = mean(&neighbor_values)?;
        let weighted = Self::weighted(&near, &neighbor_values, simple)?;
        debug!(simple, weighted = weighted.prediction, fallback = weighted.fallback_to_simple, "knn estimates");

        let mut trace = TraceBuilder::new();
        trace.push(configuration_step(KnnConfiguration {
            k,
            features: features.clone(),
            target: target.clone(),
            classes: None,
            dataset_size: n,
            query: query.clone(),
        }));
        trace.push(
            Step::new(
                "Feature Space",
                "Distances are measured on the raw feature values; no scaling is applied",
                StepDetail::KnnPreprocessing(KnnPreprocessing {
                    scaling: Scaling::None,
                    encoded: Vec::new(),
                    scalers: Vec::new(),
                    query_vector: query_vector.clone(),
                    notes: vec!["Features on larger scales weigh more in the distance".into()],
                }),
            ),
        );
        trace.push(neighbors_step(&all, &targets, &near));
        trace.push(
            Step::new(
                "Simple Average Prediction",
                "Calculate prediction as simple average of K neighbors",
                StepDetail::KnnAverage(KnnAverage {
                    neighbor_values: neighbor_values.clone(),
                    prediction: simple,
                }),
            )
            .formula("ŷ = (1/k) × Σyᵢ")
            .calculation(format!(
                "ŷ = (1/{k}) × ({}) = {:.3}",
                neighbor_values
                    .iter()
                    .map(|v| format!("{v:.2}"))
                    .collect::<Vec<_>>()
                    .join(" + "),
                simple
            )),
        );

        let weights: Vec<NeighborWeight> = near
            .iter()
            .zip(&weighted.weights)
            .map(|(r, &w)| NeighborWeight {
                index: r.index,
                distance: r.distance,
                weight: w,
                weighted_value: w * ys[r.index],
            })
            .collect();
        let mut weighted_step = Step::new(
            "Weighted Average Prediction",
            "Calculate prediction using inverse distance weighting",
            StepDetail::KnnWeightedAverage(KnnWeightedAverage {
                weights,
                total_weight: weighted.total_weight,
                weighted_prediction: weighted.prediction,
                fallback_to_simple: weighted.fallback_to_simple,
            }),
        )
        .formula("ŷ = Σ(wᵢ × yᵢ) / Σwᵢ, where wᵢ = 1/(dᵢ + ε)");
        if weighted.fallback_to_simple {
            weighted_step = weighted_step
                .calculation("All neighbors are equally distant; the weighted average equals the simple average");
        }
        trace.push(weighted_step);

        let recommended = if (weighted.prediction - simple).abs() > RECOMMENDATION_THRESHOLD {
            Recommendation::Weighted
        } else {
            Recommendation::Simple
        };
        trace.push(
            Step::new(
                "Final Prediction",
                "Compare simple vs weighted predictions",
                StepDetail::KnnComparison(KnnComparison {
                    simple_prediction: simple,
                    weighted_prediction: weighted.prediction,
                    recommended,
                }),
            )
            .calculation(format!(
                "|{:.3} - {:.3}| = {:.3}",
                weighted.prediction,
                simple,
                (weighted.prediction - simple).abs()
            )),
        );

        let mut chart_data: Vec<ChartPoint> = rows
            .iter()
            .zip(&ys)
            .zip(&all)
            .enumerate()
            .map(|(index, ((row, &target), &distance))| ChartPoint::Neighbor {
                index,
                features: row.clone(),
                target,
                distance,
                is_neighbor: near.iter().any(|r| r.index == index),
            })
            .collect();
        chart_data.push(ChartPoint::Query {
            features: query_vector,
            prediction: weighted.prediction,
        });

        info!(prediction = weighted.prediction, simple, k, "knn regression finished");
        Ok(trace
            .finish(Summary {
                algorithm: self.algorithm(),
                dataset_size: n,
                features_used: features,
                target,
                outcome: Outcome::Estimate {
                    prediction: weighted.prediction,
                    simple_prediction: simple,
                    weighted_prediction: weighted.prediction,
                    k,
                },
            })
            .with_chart_data(chart_data))
    }
}
