//! Best-effort health probes for the configured LLM providers.
//!
//! Mirrors the teacher's resilient health-check shape: `check()` and
//! `check_many()` never fail outright, they map transport/provider errors
//! into `HealthStatus { ok: false, .. }` so a caller can render a status
//! page without bubbling an error for a single flaky provider.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub ok: bool,
    pub latency_ms: u128,
    pub message: String,
}

pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            default_timeout,
        }
    }

    /// Probes a single configured tier, never returning an `Err`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let started = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Gemini => self.try_probe_gemini(cfg).await,
            LlmProvider::Groq => self.try_probe_groq(cfg).await,
        };

        let latency_ms = started.elapsed().as_millis();
        match result {
            Ok(()) => HealthStatus {
                provider: cfg.provider.to_string(),
                endpoint: cfg.endpoint.clone(),
                model: cfg.model.clone(),
                ok: true,
                latency_ms,
                message: "ok".to_string(),
            },
            Err(message) => HealthStatus {
                provider: cfg.provider.to_string(),
                endpoint: cfg.endpoint.clone(),
                model: cfg.model.clone(),
                ok: false,
                latency_ms,
                message,
            },
        }
    }

    pub async fn check_many(&self, configs: &[&LlmModelConfig]) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Strict probe: `GET {endpoint}/models?key={api_key}`, verifying the
    /// configured model id appears in the listing when possible.
    async fn try_probe_gemini(&self, cfg: &LlmModelConfig) -> Result<(), String> {
        let url = format!(
            "{}/models?key={}",
            cfg.endpoint.trim_end_matches('/'),
            cfg.api_key
        );
        let resp = self
            .client
            .get(&url)
            .timeout(cfg.timeout_secs.map(Duration::from_secs).unwrap_or(self.default_timeout))
            .send()
            .await
            .map_err(|e| format!("transport error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("http status {}", resp.status()));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| format!("decode error: {e}"))?;

        if let Some(models) = body.get("models").and_then(|m| m.as_array()) {
            let found = models.iter().any(|m| {
                m.get("name")
                    .and_then(|n| n.as_str())
                    .is_some_and(|n| n.contains(&cfg.model))
            });
            if !found {
                return Err(format!("model {} not found in listing", cfg.model));
            }
        }

        Ok(())
    }

    /// Strict probe: `GET {endpoint}/models`, OpenAI-compatible listing.
    async fn try_probe_groq(&self, cfg: &LlmModelConfig) -> Result<(), String> {
        let url = format!("{}/models", cfg.endpoint.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&cfg.api_key)
            .timeout(cfg.timeout_secs.map(Duration::from_secs).unwrap_or(self.default_timeout))
            .send()
            .await
            .map_err(|e| format!("transport error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("http status {}", resp.status()));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| format!("decode error: {e}"))?;

        if let Some(models) = body.get("data").and_then(|m| m.as_array()) {
            let found = models
                .iter()
                .any(|m| m.get("id").and_then(|n| n.as_str()) == Some(cfg.model.as_str()));
            if !found {
                return Err(format!("model {} not found in listing", cfg.model));
            }
        }

        Ok(())
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}
