//! Gemini service for text generation (Flash and Pro tiers).
//!
//! Minimal, non-streaming client around the Gemini `generateContent` REST API:
//! - POST {endpoint}/models/{model}:generateContent?key={api_key}
//!
//! Constructor validation mirrors the teacher's OpenAI client: provider must
//! be `Gemini`, the API key must be non-empty, and the endpoint must use
//! http/https.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind, make_snippet},
};

/// Result of a single generation call: text plus token accounting for pricing.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Thin client for the Gemini `generateContent` API.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
}

impl GeminiService {
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        if cfg.api_key.trim().is_empty() {
            return Err(ProviderError::new(Provider::Gemini, ProviderErrorKind::MissingApiKey).into());
        }
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            "GeminiService initialized"
        );

        Ok(Self { client, cfg })
    }

    /// Generates a single completion for `prompt`, with optional `system` instruction.
    ///
    /// `max_tokens` overrides the config's default when present (§4.6 `call()` contract).
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<Generation, AiLlmError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.cfg.endpoint.trim_end_matches('/'),
            self.cfg.model,
            self.cfg.api_key
        );

        let req = GenerateRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: system.map(|s| Content {
                role: "system".into(),
                parts: vec![Part { text: s.to_string() }],
            }),
            generation_config: GenerationConfig {
                temperature: self.cfg.temperature,
                max_output_tokens: max_tokens.or(self.cfg.max_tokens),
            },
        };

        let started = Instant::now();
        debug!(provider = "Gemini", model = %self.cfg.model, "POST generateContent");

        let resp = self.client.post(&url).json(&req).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!(snippet = %make_snippet(&text), %status, "gemini generateContent failed");
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::HttpStatus(status)).into(),
            );
        }

        let body: GenerateResponse = resp.json().await.map_err(|e| AiLlmError::Malformed {
            provider: Provider::Gemini,
            detail: e.to_string(),
        })?;

        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| AiLlmError::Malformed {
                provider: Provider::Gemini,
                detail: "no candidates in response".into(),
            })?;

        let usage = body.usage_metadata.unwrap_or_default();

        info!(
            provider = "Gemini",
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            input_tokens = usage.prompt_token_count,
            output_tokens = usage.candidates_token_count,
            "generation completed"
        );

        Ok(Generation {
            text,
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Default)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}
