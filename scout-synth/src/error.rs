//! Error taxonomy for the synthesizer (§4.2.1, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error(transparent)]
    Llm(#[from] scout_llm::AiLlmError),

    #[error("io error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
