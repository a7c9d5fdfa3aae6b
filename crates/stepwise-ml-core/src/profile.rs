//! Column profiling and target-task inference for a freshly loaded dataset.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;
use crate::dataset::{ColumnKind, Dataset};
use crate::error::{TraceError, TraceResult};

/// Numeric targets with at most this many distinct values are classes.
pub const MAX_CLASS_COUNT: usize = 20;
/// ... as are numeric targets whose distinct/total ratio is at most this.
pub const MAX_UNIQUE_RATIO: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTask {
    Classification,
    Regression,
}

impl TargetTask {
    pub fn suggested_algorithms(self) -> Vec<Algorithm> {
        match self {
            TargetTask::Classification => vec![
                Algorithm::Id3,
                Algorithm::NaiveBayes,
                Algorithm::KnnClassification,
            ],
            TargetTask::Regression => vec![
                Algorithm::LinearRegression,
                Algorithm::KnnRegression,
                Algorithm::Svr,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub n_unique: usize,
    pub n_null: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    pub column: String,
    pub inferred: TargetTask,
    pub reason: String,
    pub n: usize,
    pub n_nonnull: usize,
    pub n_unique: usize,
    pub unique_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
    pub target: TargetProfile,
    pub suggested_algorithms: Vec<Algorithm>,
}

/// Profile every column and infer whether `target` (default: last column)
/// calls for classification or regression.
pub fn profile(dataset: &Dataset, target: Option<&str>) -> TraceResult<DatasetProfile> {
    let target = match target {
        Some(t) => t.to_string(),
        None => dataset
            .columns()
            .last()
            .cloned()
            .ok_or_else(|| TraceError::EmptyInput("dataset has no columns".into()))?,
    };

    let mut columns = Vec::with_capacity(dataset.columns().len());
    for name in dataset.columns() {
        let (n_unique, n_null) = unique_and_nulls(dataset, name)?;
        columns.push(ColumnProfile {
            name: name.clone(),
            kind: dataset.column_kind(name)?,
            n_unique,
            n_null,
        });
    }

    let target_profile = infer_target(dataset, &target)?;
    Ok(DatasetProfile {
        rows: dataset.len(),
        columns,
        suggested_algorithms: target_profile.inferred.suggested_algorithms(),
        target: target_profile,
    })
}

fn unique_and_nulls(dataset: &Dataset, name: &str) -> TraceResult<(usize, usize)> {
    let values = dataset.column(name)?;
    let n_null = values.iter().filter(|v| v.is_null()).count();
    let unique: HashSet<String> = values
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| v.label())
        .collect();
    Ok((unique.len(), n_null))
}

fn infer_target(dataset: &Dataset, target: &str) -> TraceResult<TargetProfile> {
    let (n_unique, n_null) = unique_and_nulls(dataset, target)?;
    let n = dataset.len();
    let n_nonnull = n - n_null;
    let unique_ratio = n_unique as f64 / n_nonnull.max(1) as f64;

    let (inferred, reason) = match dataset.column_kind(target)? {
        ColumnKind::Categorical => (
            TargetTask::Classification,
            "Target values are text or boolean.".to_string(),
        ),
        ColumnKind::Numeric if n_unique <= MAX_CLASS_COUNT || unique_ratio <= MAX_UNIQUE_RATIO => (
            TargetTask::Classification,
            format!(
                "Numeric with limited unique values (<= {MAX_CLASS_COUNT}) or small unique ratio (<= {MAX_UNIQUE_RATIO})."
            ),
        ),
        ColumnKind::Numeric => (
            TargetTask::Regression,
            "Numeric with large number/ratio of unique values.".to_string(),
        ),
    };

    Ok(TargetProfile {
        column: target.to_string(),
        inferred,
        reason,
        n,
        n_nonnull,
        n_unique,
        unique_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn numeric_target(n: usize) -> Dataset {
        let rows = (0..n)
            .map(|i| vec![Value::Number(i as f64), Value::Number(i as f64 * 1.5)])
            .collect();
        Dataset::new(vec!["x".into(), "y".into()], rows).unwrap()
    }

    #[test]
    fn test_many_unique_numbers_is_regression() {
        let p = profile(&numeric_target(30), None).unwrap();
        assert_eq!(p.target.column, "y");
        assert_eq!(p.target.inferred, TargetTask::Regression);
        assert_eq!(p.target.n_unique, 30);
        assert_eq!(p.suggested_algorithms[0], Algorithm::LinearRegression);
    }

    #[test]
    fn test_few_unique_numbers_is_classification() {
        let p = profile(&numeric_target(12), Some("y")).unwrap();
        assert_eq!(p.target.inferred, TargetTask::Classification);
        assert_eq!(p.columns.len(), 2);
        assert_eq!(p.columns[0].kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_text_target_and_nulls() {
        let ds = Dataset::from_json_records(
            r#"[{"a": "x", "t": "yes"}, {"a": null, "t": "no"}, {"a": "x", "t": "yes"}]"#,
        )
        .unwrap();
        let p = profile(&ds, Some("t")).unwrap();
        assert_eq!(p.target.inferred, TargetTask::Classification);
        assert_eq!(p.columns[0].n_null, 1);
        assert_eq!(p.columns[0].n_unique, 1);
        assert!(profile(&ds, Some("nope")).is_err());
    }
}
