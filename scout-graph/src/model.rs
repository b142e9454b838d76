//! Data model for the persistent dependency graph (§3 `DependencyNode`,
//! `DependencyGraph`).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use scout_facts::SymbolRef;
use serde::{Deserialize, Serialize};

/// Why a node was invalidated (§3 `invalidation_reason`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationReason {
    HashMismatch,
    Cascade,
    Manual,
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvalidationReason::HashMismatch => "hash_mismatch",
            InvalidationReason::Cascade => "cascade",
            InvalidationReason::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

/// One node in the dependency graph (§3 `DependencyNode`).
///
/// Invariant (iv): if `A` is in `B.depends_on` then `B` is in `A.used_by` —
/// upheld by [`crate::graph::DependencyGraph::add_or_update`], never by
/// direct field mutation from outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyNode {
    #[serde(rename = "ref")]
    pub symbol_ref: SymbolRef,
    pub ast_hash: String,
    pub depends_on: BTreeSet<SymbolRef>,
    pub used_by: BTreeSet<SymbolRef>,
    pub invalidated_at: Option<DateTime<Utc>>,
    pub invalidation_reason: Option<InvalidationReason>,
}

impl DependencyNode {
    pub fn new(symbol_ref: SymbolRef, ast_hash: impl Into<String>) -> Self {
        Self {
            symbol_ref,
            ast_hash: ast_hash.into(),
            depends_on: BTreeSet::new(),
            used_by: BTreeSet::new(),
            invalidated_at: None,
            invalidation_reason: None,
        }
    }

    /// A node is "fresh" iff not invalidated and its source file exists and
    /// its current on-disk AST hash matches the stored one (invariant v).
    /// Existence/hash-matching is the caller's responsibility since it
    /// requires filesystem + extractor access this model layer avoids.
    pub fn is_fresh(&self, file_exists: bool, current_ast_hash: Option<&str>) -> bool {
        self.invalidated_at.is_none()
            && file_exists
            && current_ast_hash == Some(self.ast_hash.as_str())
    }
}

/// Aggregate trust metadata over a set of nodes (§4.2 `get_trust_metadata`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustMetadata {
    pub total_symbols: usize,
    pub stale_ratio: f64,
    pub invalidation_cascade_triggered: bool,
    pub invalidation_reasons: Vec<InvalidationReason>,
    pub oldest_invalidation: Option<DateTime<Utc>>,
}

/// Graph-wide counters (§4.2 `get_stats`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total: usize,
    pub stale: usize,
    pub orphaned: usize,
    pub cache_version: u32,
}
