//! Error taxonomy for the router (§4.5, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Gate(#[from] scout_gate::GateError),

    #[error(transparent)]
    Audit(#[from] scout_audit::AuditError),

    #[error("synthesis call failed: {0}")]
    Llm(#[from] scout_llm::AiLlmError),
}
