//! Column selection shared by the engines.
//!
//! Explicit parameters always win; otherwise columns are picked by name hints
//! and then by position.

use crate::dataset::{ColumnKind, Dataset};
use crate::error::{TraceError, TraceResult};
use crate::params::Parameters;

pub const REGRESSION_FEATURE_HINTS: [&str; 5] = ["YearsExperience", "Experience", "Years", "X", "x"];
pub const REGRESSION_TARGET_HINTS: [&str; 6] = ["value", "Salary", "Price", "Target", "Y", "y"];
pub const CLASSIFICATION_TARGET_HINTS: [&str; 7] =
    ["class", "target", "label", "category", "type", "species", "outcome"];

/// Feature and target for a one-feature numeric regressor.
pub fn single_feature_regression(dataset: &Dataset, params: &Parameters) -> TraceResult<(String, String)> {
    let numeric = dataset.numeric_columns();
    let feature = match &params.feature {
        Some(f) => f.clone(),
        None => match hinted(dataset, &REGRESSION_FEATURE_HINTS) {
            Some(f) => f,
            None if numeric.len() >= 2 => numeric[0].to_string(),
            None => return Err(missing(dataset, "feature")),
        },
    };
    let target = match &params.target {
        Some(t) => t.clone(),
        None => match hinted(dataset, &REGRESSION_TARGET_HINTS) {
            Some(t) => t,
            None if numeric.len() >= 2 => numeric[numeric.len() - 1].to_string(),
            None => return Err(missing(dataset, "target")),
        },
    };
    require_numeric(dataset, &feature)?;
    require_numeric(dataset, &target)?;
    Ok((feature, target))
}

/// Target for a numeric regressor over several features.
pub fn regression_target(dataset: &Dataset, params: &Parameters) -> TraceResult<String> {
    let target = match &params.target {
        Some(t) => t.clone(),
        None => match hinted(dataset, &REGRESSION_TARGET_HINTS) {
            Some(t) => t,
            None => dataset
                .numeric_columns()
                .last()
                .map(|s| s.to_string())
                .ok_or_else(|| missing(dataset, "target"))?,
        },
    };
    require_numeric(dataset, &target)?;
    Ok(target)
}

/// Target for a classifier: name hint (substring, case-insensitive) else last column.
pub fn classification_target(dataset: &Dataset, params: &Parameters) -> TraceResult<String> {
    if let Some(t) = &params.target {
        dataset.column_index(t)?;
        return Ok(t.clone());
    }
    for hint in CLASSIFICATION_TARGET_HINTS {
        if let Some(col) = dataset
            .columns()
            .iter()
            .find(|c| c.to_lowercase().contains(hint))
        {
            return Ok(col.clone());
        }
    }
    dataset
        .columns()
        .last()
        .cloned()
        .ok_or_else(|| missing(dataset, "target"))
}

/// Requested features (validated) or every column except the target.
pub fn features_or_rest(dataset: &Dataset, params: &Parameters, target: &str) -> TraceResult<Vec<String>> {
    match params.requested_features() {
        Some(features) => {
            for f in features {
                dataset.column_index(f)?;
            }
            Ok(features.to_vec())
        }
        None => Ok(dataset
            .columns()
            .iter()
            .filter(|c| c.as_str() != target)
            .cloned()
            .collect()),
    }
}

pub fn require_numeric(dataset: &Dataset, name: &str) -> TraceResult<()> {
    match dataset.column_kind(name)? {
        ColumnKind::Numeric => Ok(()),
        ColumnKind::Categorical => Err(TraceError::NonNumericColumn(name.to_string())),
    }
}

fn hinted(dataset: &Dataset, hints: &[&str]) -> Option<String> {
    hints
        .iter()
        .find(|h| dataset.has_column(h))
        .map(|h| h.to_string())
}

fn missing(dataset: &Dataset, role: &str) -> TraceError {
    TraceError::ColumnNotFound {
        name: format!("<{role}>"),
        available: dataset.columns().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_hints_and_positions() {
        let ds = Dataset::from_json_records(
            r#"[{"YearsExperience": 1.1, "Salary": 39343}, {"YearsExperience": 1.3, "Salary": 46205}]"#,
        )
        .unwrap();
        let (f, t) = single_feature_regression(&ds, &Parameters::new()).unwrap();
        assert_eq!((f.as_str(), t.as_str()), ("YearsExperience", "Salary"));

        let ds = Dataset::from_json_records(r#"[{"a": 1, "name": "n", "b": 2, "c": 3}]"#).unwrap();
        let (f, t) = single_feature_regression(&ds, &Parameters::new()).unwrap();
        assert_eq!((f.as_str(), t.as_str()), ("a", "c"));
    }

    #[test]
    fn test_regression_needs_two_numeric() {
        let ds = Dataset::from_json_records(r#"[{"a": 1, "name": "n"}]"#).unwrap();
        assert!(matches!(
            single_feature_regression(&ds, &Parameters::new()),
            Err(TraceError::ColumnNotFound { .. })
        ));
        let p = Parameters::new().with_feature("a").with_target("name");
        assert!(matches!(
            single_feature_regression(&ds, &p),
            Err(TraceError::NonNumericColumn(_))
        ));
    }

    #[test]
    fn test_classification_target() {
        let ds = Dataset::from_json_records(r#"[{"Species": "a", "w": 1, "z": "q"}]"#).unwrap();
        assert_eq!(classification_target(&ds, &Parameters::new()).unwrap(), "Species");
        let ds = Dataset::from_json_records(r#"[{"w": 1, "z": "q"}]"#).unwrap();
        assert_eq!(classification_target(&ds, &Parameters::new()).unwrap(), "z");
        assert_eq!(
            features_or_rest(&ds, &Parameters::new(), "z").unwrap(),
            vec!["w".to_string()]
        );
    }
}
