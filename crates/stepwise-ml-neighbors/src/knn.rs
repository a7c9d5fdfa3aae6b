//! Pieces shared by both KNN variants: `k` validation, the query row,
//! distance ranking and the steps that report them.

use stepwise_ml_core::dataset::ColumnKind;
use stepwise_ml_core::trace::{FeatureValue, KnnConfiguration, KnnNeighbors, Neighbor, NeighborDistance};
use stepwise_ml_core::{Dataset, Parameters, Step, StepDetail, TraceError, TraceResult, Value};
use stepwise_ml_stats::{euclidean_distance, mean};

/// Requested `k` (or `default`), which must lie in `1..=n_rows`.
pub fn resolve_k(k: Option<i64>, default: i64, n_rows: usize) -> TraceResult<usize> {
    let k = k.unwrap_or(default);
    if k <= 0 || k as u64 > n_rows as u64 {
        return Err(TraceError::InvalidK { k, n_rows });
    }
    Ok(k as usize)
}

/// The query row. A supplied example must name every feature; without one,
/// numeric features default to their mean and categorical ones to their mode.
pub fn query_values(dataset: &Dataset, params: &Parameters, features: &[String]) -> TraceResult<Vec<FeatureValue>> {
    let example = params.query();
    features
        .iter()
        .map(|f| {
            let value = match example {
                Some(e) => e
                    .get(f)
                    .cloned()
                    .ok_or_else(|| TraceError::MissingFeatureValue(f.clone()))?,
                None => match dataset.column_kind(f)? {
                    ColumnKind::Numeric => Value::Number(mean(&dataset.numeric_column(f)?)?),
                    ColumnKind::Categorical => dataset.mode(f)?,
                },
            };
            Ok(FeatureValue {
                feature: f.clone(),
                value,
            })
        })
        .collect()
}

/// A training row ranked by its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedRow {
    pub index: usize,
    pub distance: f64,
}

/// Distance from `query` to every row, in row order.
pub fn distances(rows: &[Vec<f64>], query: &[f64]) -> TraceResult<Vec<f64>> {
    rows.iter().map(|r| euclidean_distance(r, query)).collect()
}

/// The `k` closest rows, ascending by distance; equal distances keep row order.
pub fn nearest(distances: &[f64], k: usize) -> Vec<RankedRow> {
    let mut ranked: Vec<RankedRow> = distances
        .iter()
        .enumerate()
        .map(|(index, &distance)| RankedRow { index, distance })
        .collect();
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
    ranked.truncate(k);
    ranked
}

pub(crate) fn configuration_step(config: KnnConfiguration) -> Step {
    let description = format!(
        "Query {} against {} training rows using k = {}",
        config
            .query
            .iter()
            .map(|fv| format!("{}={}", fv.feature, fv.value))
            .collect::<Vec<_>>()
            .join(", "),
        config.dataset_size,
        config.k
    );
    Step::new(
        "Define Query Point and Parameters",
        description,
        StepDetail::KnnConfiguration(config),
    )
    .formula("Query point = (x₁, x₂, ..., xₙ)")
}

pub(crate) fn neighbors_step(all: &[f64], targets: &[Value], nearest: &[RankedRow]) -> Step {
    let neighbors: Vec<Neighbor> = nearest
        .iter()
        .enumerate()
        .map(|(rank, r)| Neighbor {
            rank: rank + 1,
            index: r.index,
            distance: r.distance,
            target: targets[r.index].clone(),
        })
        .collect();
    let calculation = neighbors
        .iter()
        .map(|n| format!("#{} row {} (d = {:.4}, {})", n.rank, n.index, n.distance, n.target))
        .collect::<Vec<_>>()
        .join("\n");
    Step::new(
        "Find K Nearest Neighbors",
        format!(
            "Compute the Euclidean distance to every row and keep the {} closest",
            nearest.len()
        ),
        StepDetail::KnnNeighbors(KnnNeighbors {
            distances: all
                .iter()
                .zip(targets)
                .enumerate()
                .map(|(index, (&distance, target))| NeighborDistance {
                    index,
                    distance,
                    target: target.clone(),
                })
                .collect(),
            neighbors,
        }),
    )
    .formula("d(p, q) = √Σ(pᵢ - qᵢ)²")
    .calculation(calculation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_k() {
        assert_eq!(resolve_k(None, 3, 10).unwrap(), 3);
        assert_eq!(resolve_k(Some(10), 3, 10).unwrap(), 10);
        assert_eq!(resolve_k(Some(0), 3, 10), Err(TraceError::InvalidK { k: 0, n_rows: 10 }));
        assert_eq!(resolve_k(Some(-2), 3, 10), Err(TraceError::InvalidK { k: -2, n_rows: 10 }));
        assert_eq!(resolve_k(Some(11), 3, 10), Err(TraceError::InvalidK { k: 11, n_rows: 10 }));
        assert!(resolve_k(None, 5, 4).is_err());
    }

    #[test]
    fn test_nearest_breaks_ties_by_row() {
        let d = [2.0, 1.0, 1.0, 0.5, 1.0];
        let idx: Vec<usize> = nearest(&d, 4).iter().map(|r| r.index).collect();
        assert_eq!(idx, vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_query_defaults() {
        let ds = Dataset::from_json_records(
            r#"[{"a": 1, "c": "red"}, {"a": 3, "c": "blue"}, {"a": 5, "c": "red"}]"#,
        )
        .unwrap();
        let features = vec!["a".to_string(), "c".to_string()];
        let q = query_values(&ds, &Parameters::new(), &features).unwrap();
        assert_eq!(q[0].value, Value::Number(3.0));
        assert_eq!(q[1].value, Value::from("red"));

        let p = Parameters::new().with_example([("a", 2.0)]);
        assert_eq!(
            query_values(&ds, &p, &features),
            Err(TraceError::MissingFeatureValue("c".into()))
        );
    }
}
