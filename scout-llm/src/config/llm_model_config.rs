use crate::config::llm_provider::LlmProvider;

/// Configuration for a single LLM model invocation.
///
/// One of these exists per logical tier (middle-manager, flash, pro); see
/// [`crate::service_profiles::LlmServiceProfiles`] for how the three are wired
/// together.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Which backend to call.
    pub provider: LlmProvider,

    /// Model identifier (e.g. `"gemini-1.5-flash"`, `"llama-3.3-70b-versatile"`).
    pub model: String,

    /// Inference endpoint base URL.
    pub endpoint: String,

    /// API key for authentication.
    pub api_key: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Optional per-call timeout in seconds (§5: default 60s).
    pub timeout_secs: Option<u64>,
}
