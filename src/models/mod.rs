pub mod context;
pub mod estimate;
pub mod outcome;
pub mod task;

pub use context::*;
pub use estimate::*;
pub use outcome::*;
pub use task::*;
