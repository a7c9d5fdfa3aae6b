use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// Algorithms an engine exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    LinearRegression,
    NaiveBayes,
    Id3,
    KnnClassification,
    KnnRegression,
    Svr,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::LinearRegression,
        Algorithm::NaiveBayes,
        Algorithm::Id3,
        Algorithm::KnnClassification,
        Algorithm::KnnRegression,
        Algorithm::Svr,
    ];

    /// Wire identifier, e.g. `knn_regression`.
    pub fn id(self) -> &'static str {
        match self {
            Algorithm::LinearRegression => "linear_regression",
            Algorithm::NaiveBayes => "naive_bayes",
            Algorithm::Id3 => "id3",
            Algorithm::KnnClassification => "knn_classification",
            Algorithm::KnnRegression => "knn_regression",
            Algorithm::Svr => "svr",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = TraceError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Algorithm::ALL
            .into_iter()
            .find(|a| a.id() == wanted)
            .ok_or_else(|| TraceError::UnknownAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(" KNN_Regression ".parse::<Algorithm>().unwrap(), Algorithm::KnnRegression);
        assert_eq!("ID3".parse::<Algorithm>().unwrap(), Algorithm::Id3);
        assert!(matches!("c4.5".parse::<Algorithm>(), Err(TraceError::UnknownAlgorithm(_))));
    }

    #[test]
    fn test_serde_matches_id() {
        for a in Algorithm::ALL {
            assert_eq!(serde_json::to_string(&a).unwrap(), format!("\"{}\"", a.id()));
        }
    }
}
