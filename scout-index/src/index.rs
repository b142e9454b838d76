//! Symbol index backed by SQLite (§4.8, §6 `$REPO/.scout/index.db`).
//!
//! Rather than shelling out to an external `ctags` binary (the original's
//! "ctags-produced symbol list"), this index is populated directly from
//! `scout-facts::ModuleFacts` — each `SymbolFact` already carries
//! `name`/`defined_at`/`kind`, which is exactly an `IndexEntry` row. No LLM
//! involvement anywhere in this module.

use std::path::Path;

use rusqlite::{Connection, params};
use scout_facts::ModuleFacts;
use tracing::{debug, info};

use crate::error::IndexError;
use crate::model::IndexEntry;

pub struct SymbolIndex {
    conn: Connection,
}

impl SymbolIndex {
    /// Opens (creating if needed) the index database at `path` and ensures
    /// its schema exists.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IndexError::Io {
                path: parent.to_string_lossy().to_string(),
                source: e,
            })?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory index, for tests and ephemeral single-process use.
    pub fn open_in_memory() -> Result<Self, IndexError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<(), IndexError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS symbols (
                name TEXT NOT NULL,
                name_lower TEXT NOT NULL,
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                kind TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
            CREATE INDEX IF NOT EXISTS idx_symbols_name_lower ON symbols(name_lower);",
        )?;
        Ok(())
    }

    /// Repopulates the index from a fresh set of extracted facts. Clears
    /// all existing rows first — this is a full rebuild, not an incremental
    /// merge (incremental updates are `scout-graph`'s concern, not the
    /// index's).
    pub fn rebuild_from_facts(&mut self, facts: &[ModuleFacts]) -> Result<(), IndexError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM symbols", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO symbols (name, name_lower, file, line, kind) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for module in facts {
                for (name, fact) in &module.symbols {
                    stmt.execute(params![
                        name,
                        name.to_lowercase(),
                        module.path,
                        fact.defined_at,
                        kind_label(fact.kind),
                    ])?;
                }
            }
        }
        tx.commit()?;
        info!(
            files = facts.len(),
            "rebuilt symbol index from extracted facts"
        );
        Ok(())
    }

    /// Inserts the symbols of one already-extracted module without
    /// clearing the table, for incremental single-file re-indexing.
    pub fn upsert_module(&mut self, facts: &ModuleFacts) -> Result<(), IndexError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM symbols WHERE file = ?1", params![facts.path])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO symbols (name, name_lower, file, line, kind) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (name, fact) in &facts.symbols {
                stmt.execute(params![
                    name,
                    name.to_lowercase(),
                    facts.path,
                    fact.defined_at,
                    kind_label(fact.kind),
                ])?;
            }
        }
        tx.commit()?;
        debug!(file = %facts.path, symbols = facts.symbols.len(), "re-indexed module");
        Ok(())
    }

    /// Ranked symbol-substring lookup (§4.8): exact match > prefix >
    /// substring; ties broken by file path. Never fails — any internal
    /// error degrades to an empty result, matching the original's
    /// `_query_index_safely` "returns `[]` on failure" contract.
    pub fn query_for_nav(&self, query: &str, limit: usize) -> Vec<IndexEntry> {
        self.try_query_for_nav(query, limit).unwrap_or_default()
    }

    fn try_query_for_nav(&self, query: &str, limit: usize) -> Result<Vec<IndexEntry>, IndexError> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT name, file, line, kind,
                CASE
                    WHEN name_lower = ?1 THEN 0
                    WHEN name_lower LIKE ?1 || '%' THEN 1
                    ELSE 2
                END AS rank
             FROM symbols
             WHERE name_lower = ?1 OR name_lower LIKE '%' || ?1 || '%'
             ORDER BY rank ASC, file ASC, line ASC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![needle, limit as i64], |row| {
            Ok(IndexEntry {
                name: row.get(0)?,
                file: row.get(1)?,
                line: row.get(2)?,
                kind: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn len(&self) -> Result<usize, IndexError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM symbols", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }
}

fn kind_label(kind: scout_facts::SymbolKind) -> &'static str {
    use scout_facts::SymbolKind::*;
    match kind {
        Function => "function",
        Class => "class",
        Method => "method",
        Constant => "constant",
        Variable => "variable",
        Import => "import",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_facts::{ModuleFacts, SymbolFact, SymbolKind};
    use std::collections::BTreeSet;

    fn facts(path: &str, names: &[(&str, u32, SymbolKind)]) -> ModuleFacts {
        ModuleFacts {
            path: path.to_string(),
            symbols: names
                .iter()
                .map(|(n, line, kind)| (n.to_string(), SymbolFact::new(*kind, *n, *line)))
                .collect(),
            control_flow: Vec::new(),
            imports: BTreeSet::new(),
            module_docstring: None,
            checksum: String::new(),
        }
    }

    #[test]
    fn exact_match_ranks_before_prefix_and_substring() {
        let mut idx = SymbolIndex::open_in_memory().unwrap();
        idx.rebuild_from_facts(&[facts(
            "b.py",
            &[
                ("fetch_data", 1, SymbolKind::Function),
                ("fetch", 2, SymbolKind::Function),
                ("prefetch", 3, SymbolKind::Function),
            ],
        )])
        .unwrap();

        let results = idx.query_for_nav("fetch", 10);
        assert_eq!(results[0].name, "fetch");
        assert!(results.iter().any(|r| r.name == "fetch_data"));
        assert!(results.iter().any(|r| r.name == "prefetch"));
    }

    #[test]
    fn ties_broken_by_file_path() {
        let mut idx = SymbolIndex::open_in_memory().unwrap();
        idx.rebuild_from_facts(&[
            facts("z.py", &[("run", 1, SymbolKind::Function)]),
            facts("a.py", &[("run", 1, SymbolKind::Function)]),
        ])
        .unwrap();

        let results = idx.query_for_nav("run", 10);
        assert_eq!(results[0].file, "a.py");
    }

    #[test]
    fn empty_query_returns_empty_not_error() {
        let idx = SymbolIndex::open_in_memory().unwrap();
        assert!(idx.query_for_nav("", 10).is_empty());
    }

    #[test]
    fn rebuild_clears_previous_contents() {
        let mut idx = SymbolIndex::open_in_memory().unwrap();
        idx.rebuild_from_facts(&[facts("a.py", &[("foo", 1, SymbolKind::Function)])])
            .unwrap();
        idx.rebuild_from_facts(&[facts("b.py", &[("bar", 1, SymbolKind::Function)])])
            .unwrap();

        assert_eq!(idx.len().unwrap(), 1);
        assert!(idx.query_for_nav("foo", 10).is_empty());
    }

    #[test]
    fn upsert_module_replaces_only_that_file() {
        let mut idx = SymbolIndex::open_in_memory().unwrap();
        idx.rebuild_from_facts(&[
            facts("a.py", &[("foo", 1, SymbolKind::Function)]),
            facts("b.py", &[("bar", 1, SymbolKind::Function)]),
        ])
        .unwrap();

        idx.upsert_module(&facts("a.py", &[("baz", 2, SymbolKind::Function)]))
            .unwrap();

        assert!(idx.query_for_nav("foo", 10).is_empty());
        assert!(!idx.query_for_nav("baz", 10).is_empty());
        assert!(!idx.query_for_nav("bar", 10).is_empty());
    }
}
