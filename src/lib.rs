pub mod llm;
pub mod models;
pub mod pipeline;
pub mod server;

pub use llm::{ChatProvider, CompletionClient, ProviderConfig, ProviderError, RetryPolicy};
pub use models::{
    EstimateResult, GeneratedContent, GenerationContext, GenerationReport, GenerationTask,
    MarketEstimate,
};
pub use pipeline::{Orchestrator, PipelineError};
