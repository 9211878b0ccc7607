pub mod normalize;
pub mod orchestrator;
pub mod parse;
pub mod validate;

pub use normalize::*;
pub use orchestrator::*;
pub use parse::*;
pub use validate::*;
