//! Unified entry point for the three LLM tiers (§4.6): middle-manager,
//! flash, and pro. Caches one client per distinct `(provider, endpoint,
//! model, api_key, timeout)` tuple so repeated calls against the same
//! tier reuse a connection pool instead of rebuilding `reqwest::Client`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use tracing::{info, warn};

use crate::{
    config::{default_config, llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError},
    pricing::estimate_cost_usd,
    services::{gemini_service::GeminiService, groq_service::GroqService},
};

/// Result of a single `call()`, matching the §4.6 contract exactly.
#[derive(Debug, Clone)]
pub struct LlmCallResult {
    pub content: String,
    pub cost_usd: f64,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Logical tier a caller wants to invoke. `call()` resolves the model id
/// against the matching config rather than taking a tier directly, so
/// this enum is only used internally for client-cache bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ClientKey {
    Gemini {
        endpoint_eq: u64,
        model_eq: u64,
        key_eq: u64,
        timeout_secs: u64,
    },
    Groq {
        endpoint_eq: u64,
        model_eq: u64,
        key_eq: u64,
        timeout_secs: u64,
    },
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

impl ClientKey {
    fn from_config(cfg: &LlmModelConfig) -> Self {
        let endpoint_eq = fnv1a(&cfg.endpoint);
        let model_eq = fnv1a(&cfg.model);
        let key_eq = fnv1a(&cfg.api_key);
        let timeout_secs = cfg.timeout_secs.unwrap_or(60);
        match cfg.provider {
            LlmProvider::Gemini => ClientKey::Gemini {
                endpoint_eq,
                model_eq,
                key_eq,
                timeout_secs,
            },
            LlmProvider::Groq => ClientKey::Groq {
                endpoint_eq,
                model_eq,
                key_eq,
                timeout_secs,
            },
        }
    }
}

enum ClientHandle {
    Gemini(GeminiService),
    Groq(GroqService),
}

/// Holds the three tier configs and a cache of live provider clients.
///
/// Construct once per process via [`LlmServiceProfiles::from_env`] and
/// share behind an `Arc` across the gate and router.
pub struct LlmServiceProfiles {
    middle_manager: LlmModelConfig,
    flash: LlmModelConfig,
    pro: LlmModelConfig,
    clients: RwLock<HashMap<ClientKey, Arc<ClientHandle>>>,
}

impl LlmServiceProfiles {
    /// Loads all three tier configs from environment variables (§4.6, §6).
    pub fn from_env() -> Result<Self, AiLlmError> {
        let middle_manager = default_config::config_middle_manager()?;
        let flash = default_config::config_flash()?;
        let pro = default_config::config_pro()?;

        info!(
            middle_manager_model = %middle_manager.model,
            flash_model = %flash.model,
            pro_model = %pro.model,
            "LlmServiceProfiles initialized"
        );

        Ok(Self {
            middle_manager,
            flash,
            pro,
            clients: RwLock::new(HashMap::new()),
        })
    }

    pub fn middle_manager_model(&self) -> &str {
        &self.middle_manager.model
    }

    pub fn flash_model(&self) -> &str {
        &self.flash.model
    }

    pub fn pro_model(&self) -> &str {
        &self.pro.model
    }

    fn config_for_model(&self, model: &str) -> Result<&LlmModelConfig, AiLlmError> {
        for cfg in [&self.middle_manager, &self.flash, &self.pro] {
            if cfg.model == model {
                return Ok(cfg);
            }
        }
        Err(ConfigError::UnsupportedProvider(format!(
            "no configured tier serves model {model:?}"
        ))
        .into())
    }

    fn get_or_init(&self, cfg: &LlmModelConfig) -> Result<Arc<ClientHandle>, AiLlmError> {
        let key = ClientKey::from_config(cfg);

        if let Some(existing) = self.clients.read().unwrap().get(&key) {
            return Ok(Arc::clone(existing));
        }

        let handle = match cfg.provider {
            LlmProvider::Gemini => ClientHandle::Gemini(GeminiService::new(cfg.clone())?),
            LlmProvider::Groq => ClientHandle::Groq(GroqService::new(cfg.clone())?),
        };
        let handle = Arc::new(handle);

        self.clients
            .write()
            .unwrap()
            .insert(key, Arc::clone(&handle));

        Ok(handle)
    }

    /// Invokes `model` with `prompt`/`system`, returning content plus cost
    /// accounting (§4.6 `call()` contract).
    ///
    /// `task_type` is not billed or persisted by this crate; it is carried
    /// purely for the caller's tracing/audit attribution (e.g.
    /// `gate_compress`, `big_brain_synthesis`).
    pub async fn call(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: Option<u32>,
        model: &str,
        task_type: &str,
    ) -> Result<LlmCallResult, AiLlmError> {
        let cfg = self.config_for_model(model)?;
        let handle = self.get_or_init(cfg)?;

        let result = match handle.as_ref() {
            ClientHandle::Gemini(svc) => svc.generate(prompt, system, max_tokens).await,
            ClientHandle::Groq(svc) => svc.generate(prompt, system, max_tokens).await,
        };

        match result {
            Ok(gen) => {
                let cost_usd = estimate_cost_usd(model, gen.input_tokens, gen.output_tokens);
                info!(
                    task_type,
                    model,
                    cost_usd,
                    input_tokens = gen.input_tokens,
                    output_tokens = gen.output_tokens,
                    "llm call succeeded"
                );
                Ok(LlmCallResult {
                    content: gen.text,
                    cost_usd,
                    model: model.to_string(),
                    input_tokens: gen.input_tokens,
                    output_tokens: gen.output_tokens,
                })
            }
            Err(err) => {
                warn!(task_type, model, error = %err, "llm call failed");
                Err(err)
            }
        }
    }

    /// Convenience wrapper for the middle-manager tier (§4.4).
    pub async fn call_middle_manager(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<LlmCallResult, AiLlmError> {
        let model = self.middle_manager.model.clone();
        self.call(prompt, system, max_tokens, &model, "gate_compress")
            .await
    }

    /// Convenience wrapper for the flash tier (§4.5 gate-pass path).
    pub async fn call_flash(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<LlmCallResult, AiLlmError> {
        let model = self.flash.model.clone();
        self.call(prompt, system, max_tokens, &model, "big_brain_synthesis")
            .await
    }

    /// Convenience wrapper for the pro tier (§4.5 gate-escalate path).
    pub async fn call_pro(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<LlmCallResult, AiLlmError> {
        let model = self.pro.model.clone();
        self.call(prompt, system, max_tokens, &model, "big_brain_synthesis")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(provider: LlmProvider, model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider,
            model: model.to_string(),
            endpoint: "https://example.invalid".to_string(),
            api_key: "test-key".to_string(),
            max_tokens: None,
            temperature: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn client_key_differs_by_model_even_with_same_provider() {
        let a = ClientKey::from_config(&cfg(LlmProvider::Gemini, "gemini-1.5-flash"));
        let b = ClientKey::from_config(&cfg(LlmProvider::Gemini, "gemini-1.5-pro"));
        assert_ne!(a, b);
    }

    #[test]
    fn client_key_same_for_identical_config() {
        let a = ClientKey::from_config(&cfg(LlmProvider::Groq, "llama-3.3-70b-versatile"));
        let b = ClientKey::from_config(&cfg(LlmProvider::Groq, "llama-3.3-70b-versatile"));
        assert_eq!(a, b);
    }
}
