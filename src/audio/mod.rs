pub mod extractor;
pub mod factory;
pub mod features;
pub mod interface;
pub mod pipeline;

pub use extractor::*;
pub use factory::*;
pub use features::*;
pub use interface::*;
pub use pipeline::*;
