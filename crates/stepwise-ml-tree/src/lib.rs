pub mod id3;

pub use id3::*;
