//! Error types and validation helpers for `scout-llm`.
//!
//! This module defines a focused set of configuration/provider/health errors
//! and small, reusable helpers for reading/validating environment variables.
//!
//! All error messages include the suffix `[scout-llm]` so that logs and
//! bubbled-up errors can be easily attributed to this library.

use thiserror::Error;

/// Convenient result alias for config-time operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Error enum for environment/config-driven setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[scout-llm] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[scout-llm] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider string.
    #[error("[scout-llm] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[scout-llm] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },
}

/// Which backend a request failed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Groq,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "Gemini"),
            Provider::Groq => write!(f, "Groq"),
        }
    }
}

/// Provider-level setup/transport failures.
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    #[error("config provider does not match this client")]
    InvalidProvider,
    #[error("missing API key")]
    MissingApiKey,
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited")]
    RateLimited,
    #[error("http status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
#[error("[scout-llm] {provider} error: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Top-level error surfaced to callers of the LLM client.
#[derive(Debug, Error)]
pub enum AiLlmError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("[scout-llm] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// The provider responded but the body was not parseable into the expected shape.
    #[error("[scout-llm] malformed response from {provider}: {detail}")]
    Malformed { provider: Provider, detail: String },
}

impl AiLlmError {
    /// True for failures considered transient/retriable by the gate (§4.4, §7 `llm_transport`).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AiLlmError::HttpTransport(_)
                | AiLlmError::Provider(ProviderError {
                    kind: ProviderErrorKind::Timeout | ProviderErrorKind::RateLimited,
                    ..
                })
        )
    }
}

/* ------------------------ Env helpers ------------------------ */

/// Fetches a required, non-empty environment variable.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => {
            v.parse::<u32>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber {
                    var: name,
                    reason: "expected u32",
                })
        }
        _ => Ok(None),
    }
}

/// Truncates a response body to a short, log-safe snippet.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        format!("{}…", &body[..MAX])
    }
}
