use rayon::prelude::*;
use stepwise_ml_core::{Algorithm, Dataset, Parameters, TraceDocument, TraceResult};
use tracing::info;

use crate::runner::run;

/// One independent engine invocation.
#[derive(Debug, Clone)]
pub struct Request {
    pub algorithm: Algorithm,
    pub dataset: Dataset,
    pub params: Parameters,
}

impl Request {
    pub fn new(algorithm: Algorithm, dataset: Dataset, params: Parameters) -> Self {
        Request {
            algorithm,
            dataset,
            params,
        }
    }
}

/// Run every request in parallel. Results come back in request order; one
/// failing request does not affect the others.
pub fn run_batch(requests: &[Request]) -> Vec<TraceResult<TraceDocument>> {
    info!(requests = requests.len(), "running batch");
    requests
        .par_iter()
        .map(|r| run(r.algorithm, &r.dataset, &r.params))
        .collect()
}
