use crate::algorithm::Algorithm;
use crate::dataset::Dataset;
use crate::error::TraceResult;
use crate::params::Parameters;
use crate::trace::TraceDocument;

/// An explainable algorithm: computes a result and the trace that produced it.
///
/// Implementations hold no state between calls; every input arrives through
/// the arguments.
pub trait Engine: Send + Sync {
    fn algorithm(&self) -> Algorithm;
    fn run(&self, dataset: &Dataset, params: &Parameters) -> TraceResult<TraceDocument>;
}
