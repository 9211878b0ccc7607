pub mod client;
pub mod error;
pub mod prompts;
pub mod retry;

pub use client::*;
pub use error::*;
pub use prompts::*;
pub use retry::*;
