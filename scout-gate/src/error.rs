//! Error taxonomy for the gate (§4.4, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("audit log write failed: {0}")]
    Audit(#[from] scout_audit::AuditError),
}
