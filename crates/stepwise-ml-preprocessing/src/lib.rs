pub mod encoder;
pub mod scaler;

pub use encoder::*;
pub use scaler::*;
