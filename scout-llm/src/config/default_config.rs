//! Default LLM configs loaded strictly from environment variables.
//!
//! Three roles, matching §4.4/§4.5/§6 of the design:
//!
//! - **Middle-manager** (Groq, ~70B) → compresses facts and scores confidence.
//! - **Flash** (Gemini, cheap)       → synthesis on the gate-pass path.
//! - **Pro** (Gemini, expensive)     → synthesis on the gate-escalate path.
//!
//! # Environment variables
//!
//! - `GEMINI_API_KEY`   (required for flash/pro)
//! - `GROQ_API_KEY`     (required for middle-manager)
//! - `SCOUT_FLASH_MODEL` (default `gemini-1.5-flash`)
//! - `SCOUT_PRO_MODEL`   (default `gemini-1.5-pro`)
//! - `SCOUT_MIDDLE_MANAGER_MODEL` (default `llama-3.3-70b-versatile`)
//! - `LLM_MAX_TOKENS`   (optional u32, applies to all roles)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, env_opt_u32, must_env},
};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1";

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Constructs the config for the **flash** synthesis tier (gate pass).
///
/// Defaults: `temperature = 0.3`, `timeout_secs = 60`.
pub fn config_flash() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("GEMINI_API_KEY")?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model: env_or("SCOUT_FLASH_MODEL", "gemini-1.5-flash"),
        endpoint: GEMINI_ENDPOINT.to_string(),
        api_key,
        max_tokens,
        temperature: Some(0.3),
        timeout_secs: Some(60),
    })
}

/// Constructs the config for the **pro** synthesis tier (gate escalate).
///
/// Defaults: `temperature = 0.2`, `timeout_secs = 60`.
pub fn config_pro() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("GEMINI_API_KEY")?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model: env_or("SCOUT_PRO_MODEL", "gemini-1.5-pro"),
        endpoint: GEMINI_ENDPOINT.to_string(),
        api_key,
        max_tokens,
        temperature: Some(0.2),
        timeout_secs: Some(60),
    })
}

/// Constructs the config for the **middle-manager** gate tier.
///
/// Defaults: `temperature = 0.1` (conservative, grounded compressions),
/// `timeout_secs = 60`.
pub fn config_middle_manager() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("GROQ_API_KEY")?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Groq,
        model: env_or("SCOUT_MIDDLE_MANAGER_MODEL", "llama-3.3-70b-versatile"),
        endpoint: GROQ_ENDPOINT.to_string(),
        api_key,
        max_tokens,
        temperature: Some(0.1),
        timeout_secs: Some(60),
    })
}
