use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{
    ChatProvider, CompletionClient, PromptPair, ProviderConfig, ProviderError, RetryPolicy,
    call_with_retry, compose, refine_prompt, retrieval_prompt, structuring_prompt,
};
use crate::models::{
    EstimateResult, EstimateStage, GeneratedContent, GenerationContext, GenerationReport,
    GenerationTask, MarketEstimate, ModelResponse, OutputShape, ParseOutcome,
};
use crate::pipeline::normalize::{normalize_content, normalize_text};
use crate::pipeline::parse::{parse_estimate, parse_response};
use crate::pipeline::validate::check_contract;

/// Failures that surface to the caller.
///
/// Parse and contract problems are absorbed inside the pipeline through
/// fallbacks and default substitution; only configuration and upstream
/// call failures escape.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required configuration is missing or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// A provider call failed after exhausting its retries
    #[error("{provider} call failed: {message}")]
    Upstream {
        provider: &'static str,
        message: String,
    },

    /// A market-estimate stage failed, aborting the whole flow
    #[error("market estimate aborted while {stage}: {message}")]
    EstimateAborted {
        stage: EstimateStage,
        message: String,
    },
}

impl PipelineError {
    fn upstream(provider: &'static str, err: ProviderError) -> Self {
        match err {
            ProviderError::Config(message) => PipelineError::Config(message),
            other => PipelineError::Upstream {
                provider,
                message: other.to_string(),
            },
        }
    }
}

/// Runs generation tasks end to end: compose, call, parse, normalize,
/// and contract-check
pub struct Orchestrator {
    chat: Arc<dyn ChatProvider>,
    search: Arc<dyn ChatProvider>,
    policy: RetryPolicy,
}

impl Orchestrator {
    pub fn new(
        chat: Arc<dyn ChatProvider>,
        search: Arc<dyn ChatProvider>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            chat,
            search,
            policy,
        }
    }

    /// Build an orchestrator with both providers configured from the
    /// environment
    pub fn from_env() -> Result<Self, PipelineError> {
        let chat = ProviderConfig::chat_from_env()
            .map_err(|err| PipelineError::upstream("openai", err))?;
        let search = ProviderConfig::search_from_env()
            .map_err(|err| PipelineError::upstream("perplexity", err))?;

        Ok(Self::new(
            Arc::new(CompletionClient::new(chat)),
            Arc::new(CompletionClient::new(search)),
            RetryPolicy::from_env(),
        ))
    }

    /// Name of the chat provider, for health reporting
    pub fn chat_provider(&self) -> &'static str {
        self.chat.name()
    }

    /// Name of the search provider, for health reporting
    pub fn search_provider(&self) -> &'static str {
        self.search.name()
    }

    /// Run one generation task to completion.
    ///
    /// Single-stage tasks make one chat call. The market estimate runs
    /// its three stages in order and aborts on the first stage failure.
    pub async fn run(
        &self,
        task: GenerationTask,
        ctx: &GenerationContext,
    ) -> Result<GenerationReport, PipelineError> {
        info!("Running {} generation", task);
        match task {
            GenerationTask::MarketEstimate => self.run_estimate(ctx).await,
            _ => self.run_single(task, ctx).await,
        }
    }

    /// Execute a single-stage task:
    /// 1. Compose the prompt pair for the task
    /// 2. Call the chat provider under the retry policy
    /// 3. Parse, normalize, and contract-check the output
    /// 4. Substitute deterministic defaults for anything unusable
    async fn run_single(
        &self,
        task: GenerationTask,
        ctx: &GenerationContext,
    ) -> Result<GenerationReport, PipelineError> {
        let spec = task.spec();
        let mut pairs = compose(task, ctx);
        // compose returns at least one pair for every task
        let pair = pairs.remove(0);

        let raw = self
            .call(&self.chat, task.name(), &pair, spec.json_mode)
            .await
            .map_err(|err| PipelineError::upstream(self.chat.name(), err))?;

        let (content, used_fallback_parse, mut substituted_defaults) =
            match parse_response(&raw, task) {
                ParseOutcome::Strict(content) => (content, false, false),
                ParseOutcome::Fallback(content) => {
                    info!("{}: recovered content with heuristic parsing", task);
                    (content, true, false)
                }
                ParseOutcome::Unrecoverable(reason) => {
                    warn!("{}: unusable model output ({}), substituting defaults", task, reason);
                    (default_content(task), false, true)
                }
            };

        let mut content = normalize_content(content, task);

        let contract = check_contract(&content, task);
        if !contract.is_valid {
            warn!(
                "{}: contract violations {:?}, substituting defaults",
                task, contract.violations
            );
            content = normalize_content(default_content(task), task);
            substituted_defaults = true;
        }

        Ok(GenerationReport {
            content,
            used_fallback_parse,
            substituted_defaults,
        })
    }

    /// Execute the market estimate flow:
    /// 1. Refine the raw query with the chat provider
    /// 2. Retrieve market data with the search provider, using the
    ///    refined query
    /// 3. Structure the findings into JSON with the chat provider
    ///
    /// Any stage failure aborts the flow; no partial estimate is ever
    /// returned. An unparseable final stage degrades to a placeholder
    /// estimate that carries the findings as the analysis, and the
    /// assembled content passes the same contract gate as single-stage
    /// output.
    async fn run_estimate(
        &self,
        ctx: &GenerationContext,
    ) -> Result<GenerationReport, PipelineError> {
        let mut work = ctx.clone();

        info!("Market estimate: refining query");
        let pair = refine_prompt(&work);
        let refined_raw = self
            .call(&self.chat, "market_estimate/refine", &pair, false)
            .await
            .map_err(|err| abort(EstimateStage::Refining, err))?;
        let refined_query = normalize_text(&refined_raw.raw_text);
        work.refined_query = Some(refined_query.clone());

        info!("Market estimate: retrieving market data");
        let pair = retrieval_prompt(&work);
        let findings_raw = self
            .call(&self.search, "market_estimate/retrieve", &pair, false)
            .await
            .map_err(|err| abort(EstimateStage::Retrieving, err))?;
        work.search_findings = Some(findings_raw.raw_text.clone());

        info!("Market estimate: structuring findings");
        let pair = structuring_prompt(&work);
        let structured_raw = self
            .call(&self.chat, "market_estimate/structure", &pair, true)
            .await
            .map_err(|err| abort(EstimateStage::Structuring, err))?;

        let (estimate, used_fallback_parse, mut substituted_defaults) =
            match parse_estimate(&structured_raw) {
                ParseOutcome::Strict(estimate) => (estimate, false, false),
                ParseOutcome::Fallback(estimate) => {
                    info!("Market estimate: sliced the JSON object out of prose");
                    (estimate, true, false)
                }
                ParseOutcome::Unrecoverable(reason) => {
                    warn!("Market estimate: {}; keeping the findings as the analysis", reason);
                    (
                        MarketEstimate::with_analysis(findings_raw.raw_text.clone()),
                        false,
                        true,
                    )
                }
            };

        let mut content = normalize_content(
            GeneratedContent::Estimate(EstimateResult {
                refined_query: refined_query.clone(),
                estimate,
            }),
            GenerationTask::MarketEstimate,
        );

        let contract = check_contract(&content, GenerationTask::MarketEstimate);
        if !contract.is_valid {
            warn!(
                "Market estimate: contract violations {:?}, substituting the findings analysis",
                contract.violations
            );
            content = normalize_content(
                GeneratedContent::Estimate(EstimateResult {
                    refined_query,
                    estimate: MarketEstimate::with_analysis(findings_raw.raw_text.clone()),
                }),
                GenerationTask::MarketEstimate,
            );
            substituted_defaults = true;
        }
        info!("Market estimate: done");

        Ok(GenerationReport {
            content,
            used_fallback_parse,
            substituted_defaults,
        })
    }

    async fn call(
        &self,
        provider: &Arc<dyn ChatProvider>,
        op_name: &str,
        pair: &PromptPair,
        json_mode: bool,
    ) -> Result<ModelResponse, ProviderError> {
        call_with_retry(&self.policy, op_name, || {
            provider.complete(&pair.system, &pair.user, json_mode)
        })
        .await
    }
}

fn abort(stage: EstimateStage, err: ProviderError) -> PipelineError {
    warn!("Market estimate failed while {}: {}", stage, err);
    PipelineError::EstimateAborted {
        stage,
        message: err.to_string(),
    }
}

/// Deterministic content substituted when nothing usable was produced
fn default_content(task: GenerationTask) -> GeneratedContent {
    let spec = task.spec();
    match spec.shape {
        OutputShape::List => {
            let count = spec
                .bounds
                .map(|bounds| bounds.min)
                .unwrap_or(spec.fallback_items.len());
            GeneratedContent::List(
                spec.fallback_items
                    .iter()
                    .take(count)
                    .map(|item| (*item).to_string())
                    .collect(),
            )
        }
        _ => GeneratedContent::Text(spec.fallback_text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    struct RecordedCall {
        user: String,
        json_mode: bool,
    }

    /// Provider that replays scripted responses and records every call
    struct ScriptedProvider {
        name: &'static str,
        responses: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedProvider {
        fn new(
            name: &'static str,
            responses: Vec<Result<String, ProviderError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(vec![]),
            })
        }

        fn ok(name: &'static str, texts: &[&str]) -> Arc<Self> {
            Self::new(name, texts.iter().map(|t| Ok(t.to_string())).collect())
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call(&self, index: usize) -> RecordedCall {
            self.calls.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn complete(
            &self,
            _system: &str,
            user: &str,
            json_mode: bool,
        ) -> Result<ModelResponse, ProviderError> {
            self.calls.lock().unwrap().push(RecordedCall {
                user: user.to_string(),
                json_mode,
            });
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(ModelResponse {
                    provider: self.name,
                    raw_text: text,
                    is_json_mode: json_mode,
                }),
                Some(Err(err)) => Err(err),
                None => Err(ProviderError::config("script exhausted")),
            }
        }
    }

    fn test_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            call_timeout: Duration::from_secs(5),
        }
    }

    fn orchestrator(
        chat: Arc<ScriptedProvider>,
        search: Arc<ScriptedProvider>,
    ) -> Orchestrator {
        Orchestrator::new(chat, search, test_policy(0))
    }

    fn no_search() -> Arc<ScriptedProvider> {
        ScriptedProvider::ok("search", &[])
    }

    #[tokio::test]
    async fn test_payment_text_is_normalized() {
        let chat = ScriptedProvider::ok("chat", &["«Pago mediante transferencia \u{2014} SPEI.»"]);
        let orch = orchestrator(chat.clone(), no_search());

        let report = orch
            .run(GenerationTask::PaymentText, &GenerationContext::default())
            .await
            .unwrap();

        assert_eq!(
            report.content.as_text().unwrap(),
            "Pago mediante transferencia - SPEI."
        );
        assert!(!report.used_fallback_parse);
        assert!(!report.substituted_defaults);
        assert!(!chat.call(0).json_mode);
    }

    #[tokio::test]
    async fn test_requirements_pad_to_minimum() {
        let chat = ScriptedProvider::ok(
            "chat",
            &[r#"{"requirements": ["Contrato laboral firmado", "Identificación oficial"]}"#],
        );
        let orch = orchestrator(chat.clone(), no_search());

        let report = orch
            .run(GenerationTask::RequirementsList, &GenerationContext::default())
            .await
            .unwrap();

        let items = report.content.as_list().unwrap();
        let filler = GenerationTask::RequirementsList.spec().fallback_items;
        assert_eq!(items.len(), 8);
        assert_eq!(items[0], "Contrato laboral firmado");
        assert_eq!(items[1], "Identificación oficial");
        assert_eq!(&items[2..], &filler[..6]);
        assert!(!report.used_fallback_parse);
        assert!(!report.substituted_defaults);
        assert!(chat.call(0).json_mode);
    }

    #[tokio::test]
    async fn test_requirements_truncate_to_maximum() {
        let items: Vec<String> = (1..=12).map(|n| format!("\"Requisito {n}\"")).collect();
        let raw = format!("{{\"requirements\": [{}]}}", items.join(", "));
        let chat = ScriptedProvider::ok("chat", &[&raw]);
        let orch = orchestrator(chat, no_search());

        let report = orch
            .run(GenerationTask::RequirementsList, &GenerationContext::default())
            .await
            .unwrap();

        let items = report.content.as_list().unwrap();
        assert_eq!(items.len(), 10);
        assert_eq!(items[9], "Requisito 10");
    }

    #[tokio::test]
    async fn test_suggestions_keep_model_order() {
        let chat = ScriptedProvider::ok(
            "chat",
            &["- Acta constitutiva\n- Poder del representante\n- Comprobante fiscal\n- Contrato previo"],
        );
        let orch = orchestrator(chat, no_search());

        let report = orch
            .run(
                GenerationTask::QuoteRequirementsSuggestions,
                &GenerationContext::default(),
            )
            .await
            .unwrap();

        let items = report.content.as_list().unwrap();
        assert_eq!(
            items,
            [
                "Acta constitutiva",
                "Poder del representante",
                "Comprobante fiscal",
                "Contrato previo"
            ]
        );
        assert!(!report.substituted_defaults);
    }

    #[tokio::test]
    async fn test_unusable_list_output_substitutes_defaults() {
        let chat = ScriptedProvider::ok("chat", &["```\n---\n```"]);
        let orch = orchestrator(chat, no_search());

        let report = orch
            .run(GenerationTask::RequirementsList, &GenerationContext::default())
            .await
            .unwrap();

        let spec = GenerationTask::RequirementsList.spec();
        let items = report.content.as_list().unwrap();
        assert_eq!(items.len(), 8);
        assert_eq!(&items[..], &spec.fallback_items[..8]);
        assert!(report.substituted_defaults);
    }

    #[tokio::test]
    async fn test_empty_normalized_item_substitutes_defaults() {
        // the second item normalizes down to nothing
        let chat = ScriptedProvider::ok(
            "chat",
            &[r#"{"requirements": ["Contrato firmado", "«»"]}"#],
        );
        let orch = orchestrator(chat, no_search());

        let report = orch
            .run(GenerationTask::RequirementsList, &GenerationContext::default())
            .await
            .unwrap();

        let spec = GenerationTask::RequirementsList.spec();
        let items = report.content.as_list().unwrap();
        assert_eq!(&items[..], &spec.fallback_items[..8]);
        assert!(report.substituted_defaults);
    }

    #[tokio::test]
    async fn test_empty_text_substitutes_template() {
        let chat = ScriptedProvider::ok("chat", &["«»"]);
        let orch = orchestrator(chat, no_search());

        let report = orch
            .run(GenerationTask::PaymentText, &GenerationContext::default())
            .await
            .unwrap();

        assert_eq!(
            report.content.as_text().unwrap(),
            GenerationTask::PaymentText.spec().fallback_text
        );
        assert!(report.substituted_defaults);
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces() {
        let chat = ScriptedProvider::new(
            "chat",
            vec![Err(ProviderError::api("chat", 400, "bad request"))],
        );
        let orch = orchestrator(chat, no_search());

        let err = orch
            .run(GenerationTask::QuoteShort, &GenerationContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Upstream { provider: "chat", .. }));
    }

    #[tokio::test]
    async fn test_estimate_threads_stage_outputs() {
        let refined = "honorarios divorcio incausado CDMX montos 2025";
        let findings = "Según el Colegio de Abogados, el promedio ronda los $15,000 MXN.";
        let structured = r#"{"rangosHonorarios": {"minimo": "$8,000", "maximo": "$25,000", "promedio": "$15,000", "moneda": "MXN"}, "fuentesOficiales": ["colegio de abogados"], "analisisDetallado": "Promedio de mercado."}"#;

        let chat = ScriptedProvider::ok("chat", &[refined, structured]);
        let search = ScriptedProvider::ok("search", &[findings]);
        let orch = orchestrator(chat.clone(), search.clone());

        let ctx = GenerationContext {
            query: Some("cuánto cuesta un divorcio".to_string()),
            ..Default::default()
        };
        let report = orch.run(GenerationTask::MarketEstimate, &ctx).await.unwrap();

        // stage 1 sees the raw query, stage 2 the refined query, stage 3 the findings
        assert!(chat.call(0).user.contains("cuánto cuesta un divorcio"));
        assert!(!chat.call(0).json_mode);
        assert!(search.call(0).user.contains(refined));
        assert!(!search.call(0).json_mode);
        assert!(chat.call(1).user.contains(findings));
        assert!(chat.call(1).json_mode);

        match report.content {
            GeneratedContent::Estimate(result) => {
                assert_eq!(result.refined_query, refined);
                assert_eq!(result.estimate.rangos_honorarios.promedio, "$15,000");
                assert_eq!(result.estimate.fuentes_oficiales, vec!["colegio de abogados"]);
            }
            other => panic!("expected estimate content, got {other:?}"),
        }
        assert!(!report.used_fallback_parse);
        assert!(!report.substituted_defaults);
    }

    #[tokio::test]
    async fn test_estimate_aborts_when_retrieval_fails() {
        let chat = ScriptedProvider::ok("chat", &["consulta refinada"]);
        let search = ScriptedProvider::new(
            "search",
            vec![Err(ProviderError::api("search", 503, "unavailable"))],
        );
        let orch = orchestrator(chat.clone(), search.clone());

        let ctx = GenerationContext {
            query: Some("registro de marca".to_string()),
            ..Default::default()
        };
        let err = orch.run(GenerationTask::MarketEstimate, &ctx).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::EstimateAborted {
                stage: EstimateStage::Retrieving,
                ..
            }
        ));
        // the structuring stage never ran
        assert_eq!(chat.call_count(), 1);
        assert_eq!(search.call_count(), 1);
    }

    #[tokio::test]
    async fn test_estimate_aborts_when_refinement_fails() {
        let chat = ScriptedProvider::new(
            "chat",
            vec![Err(ProviderError::api("chat", 500, "server error"))],
        );
        let search = no_search();
        let orch = orchestrator(chat, search.clone());

        let err = orch
            .run(GenerationTask::MarketEstimate, &GenerationContext::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::EstimateAborted {
                stage: EstimateStage::Refining,
                ..
            }
        ));
        assert_eq!(search.call_count(), 0);
    }

    #[tokio::test]
    async fn test_estimate_aborts_when_structuring_fails() {
        let chat = ScriptedProvider::new(
            "chat",
            vec![
                Ok("consulta refinada".to_string()),
                Err(ProviderError::api("chat", 500, "server error")),
            ],
        );
        let search = ScriptedProvider::ok("search", &["hallazgos"]);
        let orch = orchestrator(chat, search);

        let err = orch
            .run(GenerationTask::MarketEstimate, &GenerationContext::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::EstimateAborted {
                stage: EstimateStage::Structuring,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_estimate_degrades_when_structuring_is_prose() {
        let findings = "Promedio de $10,000 MXN según tarifas oficiales.";
        let chat = ScriptedProvider::ok("chat", &["consulta refinada", "No pude estructurar los datos."]);
        let search = ScriptedProvider::ok("search", &[findings]);
        let orch = orchestrator(chat, search);

        let report = orch
            .run(GenerationTask::MarketEstimate, &GenerationContext::default())
            .await
            .unwrap();

        match report.content {
            GeneratedContent::Estimate(result) => {
                assert_eq!(result.refined_query, "consulta refinada");
                assert_eq!(result.estimate.analisis_detallado, findings);
                assert_eq!(result.estimate.rangos_honorarios.minimo, "No disponible");
                assert_eq!(result.estimate.rangos_honorarios.moneda, "MXN");
            }
            other => panic!("expected estimate content, got {other:?}"),
        }
        assert!(report.substituted_defaults);
    }

    #[tokio::test]
    async fn test_estimate_content_passes_the_contract_gate() {
        let chat = ScriptedProvider::ok("chat", &["consulta refinada", "{}"]);
        let search = ScriptedProvider::ok("search", &["hallazgos de mercado"]);
        let orch = orchestrator(chat, search);

        let report = orch
            .run(GenerationTask::MarketEstimate, &GenerationContext::default())
            .await
            .unwrap();

        let contract = check_contract(&report.content, GenerationTask::MarketEstimate);
        assert!(contract.is_valid, "{:?}", contract.violations);
        assert!(!report.substituted_defaults);
    }

    #[tokio::test]
    async fn test_estimate_retries_a_retryable_stage() {
        let chat = ScriptedProvider::ok("chat", &["consulta refinada", "{}"]);
        let search = ScriptedProvider::new(
            "search",
            vec![
                Err(ProviderError::api("search", 503, "unavailable")),
                Ok("hallazgos de mercado".to_string()),
            ],
        );
        let orch = Orchestrator::new(chat.clone(), search.clone(), test_policy(1));

        let report = orch
            .run(GenerationTask::MarketEstimate, &GenerationContext::default())
            .await
            .unwrap();

        assert_eq!(search.call_count(), 2);
        assert!(!report.substituted_defaults);
    }

    #[test]
    fn test_default_content_matches_bounds() {
        for task in GenerationTask::ALL {
            let spec = task.spec();
            if let Some(bounds) = spec.bounds {
                let content = default_content(task);
                let items = content.as_list().unwrap();
                assert_eq!(items.len(), bounds.min, "{task}");
            }
        }
    }
}
