pub mod classifier;
pub mod knn;
pub mod regressor;

pub use classifier::*;
pub use knn::*;
pub use regressor::*;
