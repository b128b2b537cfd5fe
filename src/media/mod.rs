pub mod decoder;
pub mod frames;
pub mod preprocess;

pub use decoder::*;
pub use frames::*;
pub use preprocess::*;
