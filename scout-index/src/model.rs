//! Row type for the symbol index (§3 `IndexEntry`).

/// One `(symbol, file, line, kind)` row, keyed by symbol + file for fast
/// prefix lookup (§4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub file: String,
    pub line: u32,
    pub kind: String,
}
