//! Symbol index for fast-path query routing (§4.8): no LLM involvement,
//! backed by SQLite, populated from extracted facts.

pub mod error;
pub mod index;
pub mod model;

pub use error::IndexError;
pub use index::SymbolIndex;
pub use model::IndexEntry;
