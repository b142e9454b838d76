//! Groq service for text generation (middle-manager tier).
//!
//! Groq exposes an OpenAI-compatible chat completions API:
//! - POST {endpoint}/chat/completions

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind, make_snippet},
    services::gemini_service::Generation,
};

#[derive(Debug)]
pub struct GroqService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl GroqService {
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Groq {
            return Err(
                ProviderError::new(Provider::Groq, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        if cfg.api_key.trim().is_empty() {
            return Err(ProviderError::new(Provider::Groq, ProviderErrorKind::MissingApiKey).into());
        }
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Groq,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", cfg.api_key)).map_err(|e| {
                ProviderError::new(Provider::Groq, ProviderErrorKind::Decode(e.to_string()))
            })?,
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{}/chat/completions", endpoint.trim_end_matches('/'));

        info!(provider = %cfg.provider, model = %cfg.model, "GroqService initialized");

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<Generation, AiLlmError> {
        let mut messages = Vec::new();
        if let Some(s) = system {
            messages.push(ChatMessage {
                role: "system",
                content: s.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let req = ChatRequest {
            model: &self.cfg.model,
            messages,
            temperature: self.cfg.temperature,
            max_tokens: max_tokens.or(self.cfg.max_tokens),
        };

        let started = Instant::now();
        debug!(provider = "Groq", model = %self.cfg.model, "POST chat/completions");

        let resp = self.client.post(&self.url_chat).json(&req).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!(snippet = %make_snippet(&text), %status, "groq chat/completions failed");
            return Err(
                ProviderError::new(Provider::Groq, ProviderErrorKind::HttpStatus(status)).into(),
            );
        }

        let body: ChatResponse = resp.json().await.map_err(|e| AiLlmError::Malformed {
            provider: Provider::Groq,
            detail: e.to_string(),
        })?;

        let text = body
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AiLlmError::Malformed {
                provider: Provider::Groq,
                detail: "no choices in response".into(),
            })?;

        let usage = body.usage.unwrap_or_default();

        info!(
            provider = "Groq",
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            "generation completed"
        );

        Ok(Generation {
            text,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "max_tokens")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}
