use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::ProviderError;
use crate::models::ModelResponse;

/// Configuration for one chat-completions provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider name used in logs and errors
    pub provider: &'static str,
    /// API key
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model to use
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
}

impl ProviderConfig {
    /// Chat provider config from OPENAI_* environment variables
    pub fn chat_from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::config("OPENAI_API_KEY environment variable not set"))?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Ok(Self {
            provider: "openai",
            api_key,
            base_url,
            model,
            temperature: 0.4,
            max_tokens: 2048,
        })
    }

    /// Search provider config from PERPLEXITY_* environment variables
    pub fn search_from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("PERPLEXITY_API_KEY").map_err(|_| {
            ProviderError::config("PERPLEXITY_API_KEY environment variable not set")
        })?;
        let base_url = std::env::var("PERPLEXITY_BASE_URL")
            .unwrap_or_else(|_| "https://api.perplexity.ai".to_string());
        let model = std::env::var("PERPLEXITY_MODEL").unwrap_or_else(|_| "sonar".to_string());

        Ok(Self {
            provider: "perplexity",
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 4096,
        })
    }
}

/// A chat-completions provider the pipeline can call
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name used in logs and errors
    fn name(&self) -> &'static str;

    /// Run one completion. When `json_mode` is set the provider is asked
    /// to return a single JSON object.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<ModelResponse, ProviderError>;
}

/// Client for any OpenAI-compatible chat-completions API
pub struct CompletionClient {
    client: Client,
    config: ProviderConfig,
}

impl CompletionClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ChatProvider for CompletionClient {
    fn name(&self) -> &'static str {
        self.config.provider
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<ModelResponse, ProviderError> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api(
                self.config.provider,
                status,
                truncate_body(&body),
            ));
        }

        let body = response.text().await?;
        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|err| {
            ProviderError::malformed(self.config.provider, format!("invalid JSON body: {err}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ProviderError::Empty {
                provider: self.config.provider,
            });
        }

        Ok(ModelResponse {
            provider: self.config.provider,
            raw_text: content,
            is_json_mode: json_mode,
        })
    }
}

/// Error bodies can be large HTML pages; keep logs readable
fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
