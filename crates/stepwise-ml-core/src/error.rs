use thiserror::Error;

/// Broad classes of failure a caller can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed parameters: unknown columns, invalid k / C / epsilon.
    Input,
    /// Degenerate data: empty sequences, zero-variance features.
    DataQuality,
    /// Numeric defect (NaN / inf escaped the arithmetic) or a trace that
    /// breaks its own shape.
    Computation,
}

/// Core error type for every engine invocation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TraceError {
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("All weights are zero")]
    ZeroWeight,

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Insufficient data: need at least {needed} rows, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Missing value for feature '{0}' in the query example")]
    MissingFeatureValue(String),

    #[error("Column '{name}' not found. Available: {available:?}")]
    ColumnNotFound { name: String, available: Vec<String> },

    #[error("Column '{0}' is not numeric")]
    NonNumericColumn(String),

    #[error("Invalid k = {k}: must be in 1..={n_rows}")]
    InvalidK { k: i64, n_rows: usize },

    #[error("Invalid hyperparameter {name} = {value}: {reason}")]
    InvalidHyperparameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Unknown algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("Non-finite value in {0}")]
    NonFinite(String),

    #[error("Malformed trace: {0}")]
    MalformedTrace(String),
}

impl TraceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TraceError::ColumnNotFound { .. }
            | TraceError::NonNumericColumn(_)
            | TraceError::InvalidK { .. }
            | TraceError::InvalidHyperparameter { .. }
            | TraceError::UnknownAlgorithm(_)
            | TraceError::InvalidParameters(_)
            | TraceError::MalformedDataset(_)
            | TraceError::MissingFeatureValue(_)
            | TraceError::DimensionMismatch { .. } => ErrorKind::Input,
            TraceError::EmptyInput(_)
            | TraceError::ZeroWeight
            | TraceError::DegenerateInput(_)
            | TraceError::InsufficientData { .. } => ErrorKind::DataQuality,
            TraceError::NonFinite(_) | TraceError::MalformedTrace(_) => ErrorKind::Computation,
        }
    }
}

impl From<serde_json::Error> for TraceError {
    fn from(e: serde_json::Error) -> Self {
        TraceError::InvalidParameters(e.to_string())
    }
}

pub type TraceResult<T> = Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(TraceError::ZeroWeight.kind(), ErrorKind::DataQuality);
        assert_eq!(
            TraceError::InvalidK { k: 0, n_rows: 4 }.kind(),
            ErrorKind::Input
        );
        assert_eq!(TraceError::NonFinite("slope".into()).kind(), ErrorKind::Computation);
        assert_eq!(TraceError::MalformedTrace("gap".into()).kind(), ErrorKind::Computation);
    }

    #[test]
    fn test_display() {
        let e = TraceError::ColumnNotFound {
            name: "age".into(),
            available: vec!["x".into(), "y".into()],
        };
        assert_eq!(e.to_string(), "Column 'age' not found. Available: [\"x\", \"y\"]");
    }
}
