//! Context Hydrator (§4.3): token-bounded assembly of facts/docs for LLM
//! consumption. Two entry points — `hydrate_facts` for the gate's
//! structured-truth path, `hydrate_symbols` for tiered prose synthesis —
//! plus `route_query_to_files` for query-driven file selection.

pub mod facts;
pub mod routing;
pub mod symbols;
pub mod tokens;

pub use facts::hydrate_facts;
pub use routing::route_query_to_files;
pub use symbols::hydrate_symbols;
