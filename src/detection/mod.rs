pub mod fusion;
pub mod types;

pub use fusion::*;
pub use types::*;
