//! Top-level error taxonomy (§7): one short user-facing sentence per
//! variant plus the §6 exit code. Per-crate errors convert in via `From`,
//! mirroring how `scout-llm::error_handler::AiLlmError` already
//! aggregates its own provider/config errors.

use thiserror::Error;

/// The §7 error taxonomy, typed. `gate_escalated` is deliberately absent —
/// it is a decision recorded on [`scout_gate::GateDecision`], not a failure.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("missing configuration: {0}")]
    ConfigMissing(String),

    #[error("could not parse {path}: {detail}")]
    ParseError { path: String, detail: String },

    #[error("disk error: {0}")]
    IoError(String),

    #[error("the language model was unreachable: {0}")]
    LlmTransport(String),

    #[error("the language model returned something we couldn't parse: {0}")]
    LlmMalformed(String),

    #[error("no facts are available for this query")]
    NoFacts,

    #[error("estimated cost exceeded the configured budget")]
    BudgetExceeded,
}

impl ScoutError {
    /// Matches the §6 exit-code table: 0 success / 1 user error / 2 unrecoverable LLM error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScoutError::ConfigMissing(_) | ScoutError::ParseError { .. } | ScoutError::NoFacts => {
                1
            }
            ScoutError::IoError(_) | ScoutError::BudgetExceeded => 1,
            ScoutError::LlmTransport(_) | ScoutError::LlmMalformed(_) => 2,
        }
    }
}

impl From<scout_facts::ExtractError> for ScoutError {
    fn from(err: scout_facts::ExtractError) -> Self {
        match err {
            scout_facts::ExtractError::FileNotFound(path) => {
                ScoutError::ParseError { path, detail: "file not found".to_string() }
            }
            scout_facts::ExtractError::Io { path, source } => {
                ScoutError::IoError(format!("{path}: {source}"))
            }
            scout_facts::ExtractError::ParseError { path, line, detail } => ScoutError::ParseError {
                path,
                detail: format!("line {line}: {detail}"),
            },
        }
    }
}

impl From<scout_llm::AiLlmError> for ScoutError {
    fn from(err: scout_llm::AiLlmError) -> Self {
        if err.is_transport() {
            ScoutError::LlmTransport(err.to_string())
        } else {
            match err {
                scout_llm::AiLlmError::Config(_) => ScoutError::ConfigMissing(err.to_string()),
                scout_llm::AiLlmError::Malformed { .. } => ScoutError::LlmMalformed(err.to_string()),
                other => ScoutError::LlmTransport(other.to_string()),
            }
        }
    }
}

impl From<scout_gate::GateError> for ScoutError {
    fn from(err: scout_gate::GateError) -> Self {
        ScoutError::IoError(err.to_string())
    }
}

impl From<scout_router::RouterError> for ScoutError {
    fn from(err: scout_router::RouterError) -> Self {
        match err {
            scout_router::RouterError::Llm(e) => e.into(),
            other => ScoutError::IoError(other.to_string()),
        }
    }
}

impl From<scout_synth::SynthError> for ScoutError {
    fn from(err: scout_synth::SynthError) -> Self {
        match err {
            scout_synth::SynthError::Llm(e) => e.into(),
            scout_synth::SynthError::Io { path, source } => {
                ScoutError::IoError(format!("{path}: {source}"))
            }
        }
    }
}

impl From<scout_audit::AuditError> for ScoutError {
    fn from(err: scout_audit::AuditError) -> Self {
        ScoutError::IoError(err.to_string())
    }
}

impl From<scout_index::IndexError> for ScoutError {
    fn from(err: scout_index::IndexError) -> Self {
        ScoutError::IoError(err.to_string())
    }
}
