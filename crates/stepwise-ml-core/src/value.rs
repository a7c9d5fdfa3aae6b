use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TraceError, TraceResult};

/// A single cell of a tabular dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical string label used when the value is treated as a category.
    ///
    /// Integral numbers print without a fractional part so that `3` and `3.0`
    /// name the same category; missing values become `"NaN"`.
    pub fn label(&self) -> String {
        match self {
            Value::Null => "NaN".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(v) => format_number(*v),
            Value::Text(s) => s.clone(),
        }
    }

    /// Numeric reading used by distance-based engines: numbers as-is,
    /// booleans as 0/1, numeric-looking text parsed.
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub(crate) fn from_json(value: serde_json::Value) -> TraceResult<Self> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| TraceError::MalformedDataset(format!("unrepresentable number {n}"))),
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            other => Err(TraceError::MalformedDataset(format!(
                "cells must be scalars, got {other}"
            ))),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Value::Number(3.0).label(), "3");
        assert_eq!(Value::Number(2.5).label(), "2.5");
        assert_eq!(Value::Bool(true).label(), "true");
        assert_eq!(Value::Null.label(), "NaN");
        assert_eq!(Value::from("Sunny").label(), "Sunny");
    }

    #[test]
    fn test_untagged_json() {
        let v: Vec<Value> = serde_json::from_str(r#"[1.5, "a", true, null]"#).unwrap();
        assert_eq!(
            v,
            vec![Value::Number(1.5), Value::from("a"), Value::Bool(true), Value::Null]
        );
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Value::from(" 4.5 ").coerce_f64(), Some(4.5));
        assert_eq!(Value::Bool(true).coerce_f64(), Some(1.0));
        assert_eq!(Value::from("hot").coerce_f64(), None);
    }
}
