pub mod algorithm;
pub mod columns;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod params;
pub mod profile;
pub mod trace;
pub mod value;

pub use algorithm::Algorithm;
pub use dataset::{ColumnKind, Dataset, Record};
pub use engine::Engine;
pub use error::{ErrorKind, TraceError, TraceResult};
pub use params::{Example, Parameters};
pub use trace::{Step, StepDetail, Summary, TraceBuilder, TraceDocument};
pub use value::Value;
