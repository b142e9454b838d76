//! Error taxonomy for the audit log (§4.7, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("io error writing audit log at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize audit event: {0}")]
    Serialize(#[from] serde_json::Error),
}
