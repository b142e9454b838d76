//! Data model for the AST fact extractor (§3).
//!
//! Every type here is derived purely from parsing; no field is ever set
//! from an LLM response.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Stable identity for a symbol, used as cache key, graph node key, and
/// lock entry. Equality is structural on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolRef {
    /// Relative filesystem path from the repo root.
    pub path: String,
    /// Symbol name; empty denotes the entire file.
    pub symbol: String,
}

impl SymbolRef {
    pub fn new(path: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            symbol: symbol.into(),
        }
    }

    /// A ref denoting the whole file (empty `symbol`).
    pub fn whole_file(path: impl Into<String>) -> Self {
        Self::new(path, "")
    }
}

impl std::fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.path, self.symbol)
    }
}

/// Kind of a named symbol recorded by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Constant,
    Variable,
    Import,
}

/// A fact recorded about one named symbol (§3 `SymbolFact`).
///
/// All fields are derived purely from parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFact {
    pub kind: SymbolKind,
    pub name: String,
    pub defined_at: u32,
    /// Line numbers where the name is referenced in a load context.
    #[serde(default)]
    pub used_at: BTreeSet<u32>,
    /// Canonical lexical form of the literal, when statically parseable.
    #[serde(default)]
    pub value: Option<String>,
    /// Parameter names + defaults rendered lexically, for functions/methods.
    #[serde(default)]
    pub signature: Option<String>,
    /// Owning class name, for methods.
    #[serde(default)]
    pub parent: Option<String>,
}

impl SymbolFact {
    pub fn new(kind: SymbolKind, name: impl Into<String>, defined_at: u32) -> Self {
        Self {
            kind,
            name: name.into(),
            defined_at,
            used_at: BTreeSet::new(),
            value: None,
            signature: None,
            parent: None,
        }
    }
}

/// Structural facts about a function/method body (§3 `ControlFlowFact`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlFlowFact {
    /// Exception/error type names raised in this scope, in source order.
    #[serde(default)]
    pub raise_sites: Vec<String>,
    /// Lexical text of `if`/`while`/guard conditions, in source order.
    #[serde(default)]
    pub guard_conditions: Vec<String>,
    /// Number of `for`/`while` loop constructs directly in this scope.
    #[serde(default)]
    pub loop_count: u32,
}

/// The atomic unit of cached truth produced by the extractor (§3 `ModuleFacts`).
///
/// Invariants upheld by construction:
/// - the checksum is stable under re-parsing of the same source bytes;
/// - `symbols` serializes in insertion order, which the extractor fills
///   top-to-bottom during its single parse pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleFacts {
    pub path: String,
    /// Ordered map: insertion order is top-to-bottom parse order (invariant iii).
    pub symbols: Vec<(String, SymbolFact)>,
    #[serde(default)]
    pub control_flow: Vec<(String, ControlFlowFact)>,
    pub imports: BTreeSet<String>,
    pub module_docstring: Option<String>,
    /// Content-addressed digest over the canonical JSON serialization.
    pub checksum: String,
}

impl ModuleFacts {
    /// Looks up a symbol fact by name, preserving the document's ordered-map
    /// semantics without requiring callers to scan the `Vec` by hand.
    pub fn symbol(&self, name: &str) -> Option<&SymbolFact> {
        self.symbols.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}
