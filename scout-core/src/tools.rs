//! Static registry describing the four §6 operations as data (§3
//! supplement from `original_source/vivarium/scout/tools.py::ToolSpec`).
//!
//! This is not an LLM-facing capability-routing layer — the original's
//! `interpret_command_async` chat-command interpreter is the out-of-scope
//! REPL shell. It is only the "what can this binary do" surface so a
//! `--list-tools` flag (or any future caller) doesn't need the four
//! operations hardcoded a second time.

/// Relative cost of invoking one operation, for display purposes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostTier {
    Free,
    Cheap,
    Variable,
}

/// Relative latency of one operation, for display purposes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedTier {
    Instant,
    Fast,
    Slow,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub cost: CostTier,
    pub speed: SpeedTier,
    pub desc: &'static str,
}

/// The four §6 operations, in table order.
pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "query",
        params: &["question", "scope"],
        cost: CostTier::Variable,
        speed: SpeedTier::Slow,
        desc: "Answer a natural-language question via the gated synthesis pipeline",
    },
    ToolSpec {
        name: "sync",
        params: &["scope", "changed_only"],
        cost: CostTier::Variable,
        speed: SpeedTier::Slow,
        desc: "Regenerate .tldr.md/.deep.md living docs from extracted facts",
    },
    ToolSpec {
        name: "nav",
        params: &["task"],
        cost: CostTier::Free,
        speed: SpeedTier::Instant,
        desc: "Rank files relevant to a natural-language task, never fails",
    },
    ToolSpec {
        name: "index.query",
        params: &["query", "limit"],
        cost: CostTier::Free,
        speed: SpeedTier::Instant,
        desc: "Look up symbols by substring in the SQLite symbol index",
    },
];

pub fn find(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_all_four_operations() {
        assert_eq!(TOOLS.len(), 4);
        assert!(find("query").is_some());
        assert!(find("sync").is_some());
        assert!(find("nav").is_some());
        assert!(find("index.query").is_some());
        assert!(find("nonexistent").is_none());
    }
}
