use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{TraceError, TraceResult};
use crate::value::Value;

/// One row rendered as an ordered JSON object (column order preserved).
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Inferred storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Read-only tabular dataset: named columns, rows of scalar values.
///
/// Every row holds exactly one value per column; the column order is the
/// order of the source records and drives every "first"/"last" column rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    index: HashMap<String, usize>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> TraceResult<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(TraceError::MalformedDataset(format!(
                    "duplicate column '{name}'"
                )));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TraceError::MalformedDataset(format!(
                    "row {i} has {} values, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Dataset { columns, rows, index })
    }

    /// Build from ordered records. The first record fixes the column order and
    /// every other record must carry exactly the same keys.
    pub fn from_records(records: Vec<Record>) -> TraceResult<Self> {
        let columns: Vec<String> = match records.first() {
            Some(first) => first.keys().cloned().collect(),
            None => Vec::new(),
        };
        let mut rows = Vec::with_capacity(records.len());
        for (i, mut record) in records.into_iter().enumerate() {
            if record.len() != columns.len() {
                return Err(TraceError::MalformedDataset(format!(
                    "record {i} has {} fields, expected {}",
                    record.len(),
                    columns.len()
                )));
            }
            let mut row = Vec::with_capacity(columns.len());
            for name in &columns {
                let cell = record.remove(name).ok_or_else(|| {
                    TraceError::MalformedDataset(format!("record {i} is missing column '{name}'"))
                })?;
                row.push(Value::from_json(cell)?);
            }
            rows.push(row);
        }
        Dataset::new(columns, rows)
    }

    /// Parse a JSON array of objects.
    pub fn from_json_records(json: &str) -> TraceResult<Self> {
        let records: Vec<Record> = serde_json::from_str(json)
            .map_err(|e| TraceError::MalformedDataset(e.to_string()))?;
        Dataset::from_records(records)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> TraceResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| TraceError::ColumnNotFound {
                name: name.to_string(),
                available: self.columns.clone(),
            })
    }

    /// All values of a column, in row order.
    pub fn column(&self, name: &str) -> TraceResult<Vec<&Value>> {
        let c = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[c]).collect())
    }

    /// Numeric iff every non-null value is a number and at least one exists.
    pub fn column_kind(&self, name: &str) -> TraceResult<ColumnKind> {
        let c = self.column_index(name)?;
        Ok(self.kind_at(c))
    }

    fn kind_at(&self, c: usize) -> ColumnKind {
        let mut seen = false;
        for row in &self.rows {
            match &row[c] {
                Value::Null => {}
                Value::Number(_) => seen = true,
                _ => return ColumnKind::Categorical,
            }
        }
        if seen {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns_of(ColumnKind::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns_of(ColumnKind::Categorical)
    }

    fn columns_of(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(c, _)| self.kind_at(*c) == kind)
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Values of a numeric column. Fails on text/bool cells and on gaps.
    pub fn numeric_column(&self, name: &str) -> TraceResult<Vec<f64>> {
        let c = self.column_index(name)?;
        let mut out = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            match &row[c] {
                Value::Number(v) => out.push(*v),
                Value::Null => {
                    return Err(TraceError::DegenerateInput(format!(
                        "column '{name}' has missing values"
                    )))
                }
                _ => return Err(TraceError::NonNumericColumn(name.to_string())),
            }
        }
        Ok(out)
    }

    /// Category labels of a column, in row order.
    pub fn labels(&self, name: &str) -> TraceResult<Vec<String>> {
        let c = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[c].label()).collect())
    }

    /// Distinct labels in first-seen order.
    pub fn distinct_labels(&self, name: &str) -> TraceResult<Vec<String>> {
        Ok(first_seen(&self.labels(name)?))
    }

    /// Most frequent value of a column; ties go to the value seen first.
    pub fn mode(&self, name: &str) -> TraceResult<Value> {
        let values = self.column(name)?;
        let labels: Vec<String> = values.iter().map(|v| v.label()).collect();
        let mut best: Option<(usize, usize)> = None;
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                continue;
            }
            let count = labels.iter().filter(|l| *l == label).count();
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((i, count));
            }
        }
        best.map(|(i, _)| values[i].clone())
            .ok_or_else(|| TraceError::EmptyInput(format!("column '{name}'")))
    }

    /// The first `n` rows as ordered JSON records.
    pub fn preview(&self, n: usize) -> Vec<Record> {
        self.rows
            .iter()
            .take(n)
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, v)| (name.clone(), v.to_json()))
                    .collect()
            })
            .collect()
    }
}

/// Deduplicate while keeping first-seen order.
pub fn first_seen(labels: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for l in labels {
        if !out.contains(l) {
            out.push(l.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather() -> Dataset {
        Dataset::from_json_records(
            r#"[
                {"outlook": "Sunny", "temp": 30, "windy": false, "play": "No"},
                {"outlook": "Rain", "temp": 18.5, "windy": true, "play": "Yes"},
                {"outlook": "Sunny", "temp": 25, "windy": true, "play": "Yes"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_column_order_and_kinds() {
        let ds = weather();
        assert_eq!(ds.columns(), &["outlook", "temp", "windy", "play"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.numeric_columns(), vec!["temp"]);
        assert_eq!(ds.categorical_columns(), vec!["outlook", "windy", "play"]);
        assert_eq!(ds.numeric_column("temp").unwrap(), vec![30.0, 18.5, 25.0]);
    }

    #[test]
    fn test_labels_and_mode() {
        let ds = weather();
        assert_eq!(ds.distinct_labels("outlook").unwrap(), vec!["Sunny", "Rain"]);
        assert_eq!(ds.mode("outlook").unwrap(), Value::from("Sunny"));
        assert_eq!(ds.mode("play").unwrap(), Value::from("Yes"));
        assert_eq!(ds.labels("windy").unwrap(), vec!["false", "true", "true"]);
    }

    #[test]
    fn test_errors() {
        let ds = weather();
        assert!(matches!(ds.column_index("humidity"), Err(TraceError::ColumnNotFound { .. })));
        assert!(matches!(ds.numeric_column("outlook"), Err(TraceError::NonNumericColumn(_))));

        let ragged = Dataset::from_json_records(r#"[{"a": 1, "b": 2}, {"a": 1}]"#);
        assert!(matches!(ragged, Err(TraceError::MalformedDataset(_))));
        let renamed = Dataset::from_json_records(r#"[{"a": 1, "b": 2}, {"a": 1, "c": 2}]"#);
        assert!(matches!(renamed, Err(TraceError::MalformedDataset(_))));
    }

    #[test]
    fn test_preview_keeps_order() {
        let ds = weather();
        let preview = ds.preview(2);
        assert_eq!(preview.len(), 2);
        let keys: Vec<&String> = preview[0].keys().collect();
        assert_eq!(keys, vec!["outlook", "temp", "windy", "play"]);
        assert_eq!(preview[1]["temp"], serde_json::json!(18.5));
    }
}
