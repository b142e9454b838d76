//! Deterministic AST fact extraction (§4.1): a pure function from Python
//! source to structured [`model::ModuleFacts`], with no network calls, no
//! cache reads, and no LLM involvement.

pub mod checksum;
pub mod error;
pub mod extractor;
pub mod model;
pub mod persist;

pub use error::ExtractError;
pub use extractor::extract;
pub use model::{ControlFlowFact, ModuleFacts, SymbolFact, SymbolKind, SymbolRef};
