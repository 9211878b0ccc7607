//! Route handlers for the generation API.
//!
//! Every POST route runs through [`run_task`]: execute the pipeline for
//! the route's task, then shape the content for that route's wire
//! format. Pipeline failures become a 500 with a generic localized
//! message; the details stay in the server log under a correlation id.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::models::{GeneratedContent, GenerationContext, GenerationTask, MarketEstimate};
use crate::pipeline::PipelineError;
use crate::server::AppState;

/// Wire shape for payment-text responses
#[derive(Debug, Serialize)]
pub struct PaymentTextResponse {
    #[serde(rename = "generatedText")]
    pub generated_text: String,
    pub success: bool,
}

/// Wire shape for requirements-list responses
#[derive(Debug, Serialize)]
pub struct RequirementsResponse {
    pub requirements: Vec<String>,
    pub success: bool,
}

/// Wire shape for the three suggestion routes
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub options: Vec<String>,
}

/// Wire shape for quote-text responses
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub contenido: String,
}

/// Wire shape for market-estimate responses: the refined query plus the
/// estimate fields flattened to the top level
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    #[serde(rename = "refinedQuery")]
    pub refined_query: String,
    #[serde(flatten)]
    pub estimate: MarketEstimate,
}

/// Generic error body returned with HTTP 500
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub async fn payment_text(
    State(state): State<AppState>,
    Json(ctx): Json<GenerationContext>,
) -> Response {
    run_task(state, GenerationTask::PaymentText, ctx).await
}

pub async fn requirements(
    State(state): State<AppState>,
    Json(ctx): Json<GenerationContext>,
) -> Response {
    run_task(state, GenerationTask::RequirementsList, ctx).await
}

pub async fn requirement_suggestions(
    State(state): State<AppState>,
    Json(ctx): Json<GenerationContext>,
) -> Response {
    run_task(state, GenerationTask::QuoteRequirementsSuggestions, ctx).await
}

pub async fn need_suggestions(
    State(state): State<AppState>,
    Json(ctx): Json<GenerationContext>,
) -> Response {
    run_task(state, GenerationTask::NeedsSuggestions, ctx).await
}

pub async fn time_suggestions(
    State(state): State<AppState>,
    Json(ctx): Json<GenerationContext>,
) -> Response {
    run_task(state, GenerationTask::TimeSuggestions, ctx).await
}

pub async fn quote_short(
    State(state): State<AppState>,
    Json(ctx): Json<GenerationContext>,
) -> Response {
    run_task(state, GenerationTask::QuoteShort, ctx).await
}

pub async fn quote_detailed(
    State(state): State<AppState>,
    Json(ctx): Json<GenerationContext>,
) -> Response {
    run_task(state, GenerationTask::QuoteDetailed, ctx).await
}

pub async fn market_estimate(
    State(state): State<AppState>,
    Json(ctx): Json<GenerationContext>,
) -> Response {
    run_task(state, GenerationTask::MarketEstimate, ctx).await
}

/// Run one task through the pipeline and shape the outcome for the wire
async fn run_task(state: AppState, task: GenerationTask, ctx: GenerationContext) -> Response {
    match state.orchestrator.run(task, &ctx).await {
        Ok(report) => success_response(task, report.content),
        Err(err) => failure_response(task, &err),
    }
}

/// Pick the wire envelope for a task's content.
///
/// The content shape always matches the task here: the orchestrator
/// substitutes shape-correct defaults for anything unusable, so text
/// tasks deliver text and list tasks deliver a list.
fn success_response(task: GenerationTask, content: GeneratedContent) -> Response {
    match content {
        GeneratedContent::Text(text) => match task {
            GenerationTask::PaymentText => Json(PaymentTextResponse {
                generated_text: text,
                success: true,
            })
            .into_response(),
            _ => Json(QuoteResponse { contenido: text }).into_response(),
        },
        GeneratedContent::List(items) => match task {
            GenerationTask::RequirementsList => Json(RequirementsResponse {
                requirements: items,
                success: true,
            })
            .into_response(),
            _ => Json(OptionsResponse { options: items }).into_response(),
        },
        GeneratedContent::Estimate(result) => Json(EstimateResponse {
            refined_query: result.refined_query,
            estimate: result.estimate,
        })
        .into_response(),
    }
}

/// Log the failure under a correlation id and hand the caller a generic
/// localized message
fn failure_response(task: GenerationTask, error: &PipelineError) -> Response {
    let correlation_id = Uuid::new_v4();
    error!(
        "{} request failed [{}]: {}",
        task.name(),
        correlation_id,
        error
    );

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: generic_message(task).to_string(),
        }),
    )
        .into_response()
}

fn generic_message(task: GenerationTask) -> &'static str {
    match task {
        GenerationTask::PaymentText => "No se pudo generar el texto de pago. Intenta de nuevo.",
        GenerationTask::RequirementsList => {
            "No se pudieron generar los requisitos. Intenta de nuevo."
        }
        GenerationTask::QuoteShort | GenerationTask::QuoteDetailed => {
            "No se pudo generar la cotización. Intenta de nuevo."
        }
        GenerationTask::QuoteRequirementsSuggestions
        | GenerationTask::NeedsSuggestions
        | GenerationTask::TimeSuggestions => {
            "No se pudieron generar las sugerencias. Intenta de nuevo."
        }
        GenerationTask::MarketEstimate => {
            "No se pudo generar la estimación de mercado. Intenta de nuevo."
        }
    }
}
