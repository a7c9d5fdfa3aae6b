//! # stepwise-ml
//!
//! Classical machine-learning algorithms that return, next to their result,
//! every intermediate quantity that produced it as an ordered trace.
//!
//! ## Modules
//!
//! - **core**: Dataset view, parameters, trace model, errors, dataset profiling
//! - **stats**: Mean, variance, covariance, distance, entropy, weighted average, R²
//! - **preprocessing**: StandardScaler, LabelEncoder
//! - **linear**: Ordinary least squares on one feature
//! - **naive_bayes**: Categorical Naive Bayes with Laplace smoothing
//! - **tree**: ID3 root-split information gain
//! - **neighbors**: KNN classification (standardized) and regression (simple vs weighted)
//! - **svm**: Linear ε-insensitive SVR with support-vector report
//!
//! ```no_run
//! use stepwise_ml::{run, Algorithm, Dataset, Parameters};
//!
//! let data = Dataset::from_json_records(r#"[{"x": 1, "y": 2}, {"x": 2, "y": 4}]"#)?;
//! let trace = run(Algorithm::LinearRegression, &data, &Parameters::new())?;
//! for step in &trace.steps {
//!     println!("{}. {}", step.step_number, step.title);
//! }
//! # Ok::<(), stepwise_ml::TraceError>(())
//! ```

mod batch;
mod runner;

/// Dataset view, parameters and trace model.
pub use stepwise_ml_core as core;

/// Statistics primitives.
pub use stepwise_ml_stats as stats;

/// Data preprocessing.
pub use stepwise_ml_preprocessing as preprocessing;

/// Linear regression.
pub use stepwise_ml_linear as linear;

/// Naive Bayes.
pub use stepwise_ml_naive_bayes as naive_bayes;

/// ID3 root split.
pub use stepwise_ml_tree as tree;

/// Nearest neighbors.
pub use stepwise_ml_neighbors as neighbors;

/// Support vector regression.
pub use stepwise_ml_svm as svm;

pub use batch::{run_batch, Request};
pub use runner::{engine_for, run, run_json};
pub use stepwise_ml_core::profile::{profile, DatasetProfile, TargetTask};
pub use stepwise_ml_core::{
    Algorithm, Dataset, Engine, ErrorKind, Parameters, Step, StepDetail, Summary, TraceDocument,
    TraceError, TraceResult, Value,
};
