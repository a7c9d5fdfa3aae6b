use stepwise_ml_core::{Algorithm, Dataset, Engine, Parameters, TraceDocument, TraceResult};
use stepwise_ml_linear::LinearRegression;
use stepwise_ml_naive_bayes::NaiveBayes;
use stepwise_ml_neighbors::{KnnClassification, KnnRegression};
use stepwise_ml_svm::Svr;
use stepwise_ml_tree::Id3;
use tracing::{debug, info_span, warn};

/// The engine implementing `algorithm`.
pub fn engine_for(algorithm: Algorithm) -> Box<dyn Engine> {
    match algorithm {
        Algorithm::LinearRegression => Box::new(LinearRegression),
        Algorithm::NaiveBayes => Box::new(NaiveBayes),
        Algorithm::Id3 => Box::new(Id3),
        Algorithm::KnnClassification => Box::new(KnnClassification),
        Algorithm::KnnRegression => Box::new(KnnRegression),
        Algorithm::Svr => Box::new(Svr::default()),
    }
}

/// Run one algorithm over a dataset and return its full trace.
pub fn run(algorithm: Algorithm, dataset: &Dataset, params: &Parameters) -> TraceResult<TraceDocument> {
    let span = info_span!("run", %algorithm);
    let _guard = span.enter();
    let result = engine_for(algorithm).run(dataset, params);
    match &result {
        Ok(doc) => debug!(steps = doc.steps.len(), "trace complete"),
        Err(e) => warn!(error = %e, kind = ?e.kind(), "engine failed"),
    }
    result
}

/// JSON in, JSON out: `algorithm` is a case-insensitive identifier,
/// `dataset_json` an array of records and `params_json` the parameter
/// object (empty string for defaults). The trace is validated before it is
/// serialized.
pub fn run_json(algorithm: &str, dataset_json: &str, params_json: &str) -> TraceResult<String> {
    let algorithm: Algorithm = algorithm.parse()?;
    let dataset = Dataset::from_json_records(dataset_json)?;
    let params = Parameters::from_json(params_json)?;
    run(algorithm, &dataset, &params)?.to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_ml_core::TraceError;

    #[test]
    fn test_engine_for_every_algorithm() {
        for a in Algorithm::ALL {
            assert_eq!(engine_for(a).algorithm(), a);
        }
    }

    #[test]
    fn test_run_json_errors() {
        assert!(matches!(
            run_json("gradient_boosting", "[]", ""),
            Err(TraceError::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            run_json("svr", r#"[{"x": 1, "y": 2}]"#, "{"),
            Err(TraceError::InvalidParameters(_))
        ));
        assert!(matches!(
            run_json("svr", "not json", ""),
            Err(TraceError::MalformedDataset(_))
        ));
    }
}
