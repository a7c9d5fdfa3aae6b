//! Pure statistics primitives shared by every engine.
//!
//! All functions use population formulas and reject empty input with
//! [`TraceError::EmptyInput`](stepwise_ml_core::TraceError::EmptyInput).

pub mod descriptive;
pub mod distance;
pub mod entropy;
pub mod regression;

pub use descriptive::*;
pub use distance::*;
pub use entropy::*;
pub use regression::*;

use stepwise_ml_core::{TraceError, TraceResult};

/// Pass `value` through, or report which quantity stopped being finite.
pub fn finite(name: &str, value: f64) -> TraceResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TraceError::NonFinite(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite() {
        assert_eq!(finite("x", 1.5).unwrap(), 1.5);
        assert_eq!(finite("slope", f64::NAN), Err(TraceError::NonFinite("slope".into())));
        assert!(finite("w", f64::INFINITY).is_err());
    }
}
