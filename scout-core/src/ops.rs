//! The four §6 operations (`query`, `sync`, `nav`, `index.query`),
//! wiring the eight subsystem crates together. This is the only module
//! that owns mutable access to the dependency graph and the symbol
//! index — everything else in the workspace takes them as arguments.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use scout_audit::AuditLog;
use scout_facts::{ModuleFacts, SymbolRef};
use scout_gate::MiddleManagerGate;
use scout_graph::DependencyGraph;
use scout_index::{IndexEntry, SymbolIndex};
use scout_llm::LlmServiceProfiles;
use scout_router::BigBrainRouter;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::DisplayPrefs;
use crate::error::ScoutError;

const QUERY_MAX_FACTS: usize = 200;
const QUERY_MAX_DEPTH: u32 = 2;
const QUERY_MAX_TOKENS: usize = 4096;

/// Owns the long-lived state one process needs for all four operations:
/// the LLM client pool, the dependency graph, the audit log, and the
/// symbol index. Constructed once at startup (§5 — no global singletons,
/// §9 redesign flag).
pub struct ScoutCore {
    repo_root: PathBuf,
    profiles: Arc<LlmServiceProfiles>,
    graph: DependencyGraph,
    audit: AuditLog,
    index: SymbolIndex,
    router: BigBrainRouter,
    pub display: DisplayPrefs,
}

impl ScoutCore {
    /// Loads LLM configs from the environment, opens the repo's symbol
    /// index and audit log, and loads the (process-global, per §4.2)
    /// dependency graph cache.
    pub fn open(repo_root: impl Into<PathBuf>) -> Result<Self, ScoutError> {
        let repo_root = repo_root.into();
        let profiles = Arc::new(LlmServiceProfiles::from_env()?);
        let audit = AuditLog::for_repo(&repo_root);
        let graph = DependencyGraph::load_cache();
        let index = SymbolIndex::open(&repo_root.join(".scout").join("index.db"))?;
        let gate = MiddleManagerGate::new(audit.clone());
        let router = BigBrainRouter::new(Arc::clone(&profiles), gate, audit.clone());

        Ok(Self {
            repo_root,
            profiles,
            graph,
            audit,
            index,
            router,
            display: DisplayPrefs::from_env(),
        })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// `query(question, scope)` (§6): routes to relevant files, hydrates
    /// facts and prose context, then runs the gated synthesis pipeline.
    /// Errors: `no_facts`, `llm_error`.
    pub async fn query(&self, question: &str, scope: &str) -> Result<String, ScoutError> {
        let files = scout_context::route_query_to_files(
            question,
            scope,
            &self.repo_root,
            Some(&self.index),
        );
        if files.is_empty() {
            return Err(ScoutError::NoFacts);
        }

        let seeds: Vec<SymbolRef> = files
            .iter()
            .map(|f| SymbolRef::whole_file(f.to_string_lossy().into_owned()))
            .collect();

        let facts = scout_context::hydrate_facts(
            &seeds,
            &self.graph,
            &self.repo_root,
            QUERY_MAX_FACTS,
            QUERY_MAX_DEPTH,
        );
        if facts.symbols.is_empty() {
            return Err(ScoutError::NoFacts);
        }

        let raw_tldr = scout_context::hydrate_symbols(
            &seeds,
            &self.graph,
            &self.repo_root,
            QUERY_MAX_DEPTH,
            QUERY_MAX_TOKENS,
        );
        let query_symbols: Vec<String> = facts.symbols.iter().map(|(name, _)| name.clone()).collect();

        let result = self
            .router
            .call_gated(
                question,
                Some(&facts),
                Some(&raw_tldr),
                Some(query_symbols.as_slice()),
            )
            .await?;

        info!(
            question,
            model = %result.model,
            cost_usd = result.cost_usd,
            "query answered"
        );
        Ok(result.content)
    }

    /// `sync(scope, changed_only)` (§6): re-extracts facts for every
    /// source file under `scope`, refreshes the dependency graph and
    /// symbol index, and regenerates living docs. Returns the count of
    /// regenerated docs. A parse error on one file is recorded and the
    /// file is skipped — it does not halt the run (§7).
    pub async fn sync(
        &mut self,
        scope: &str,
        changed_only: bool,
        deep: bool,
    ) -> Result<usize, ScoutError> {
        let files = collect_py_files(&self.repo_root, scope);
        let module_paths = build_module_path_index(&files);

        let mut regenerated = 0usize;
        let mut all_facts: Vec<ModuleFacts> = Vec::new();

        for rel in &files {
            let abs = self.repo_root.join(rel);

            let previous = match scout_facts::persist::load(&abs) {
                Ok(p) => p,
                Err(err) => {
                    warn!(path = %rel.display(), error = %err, "cache read failed, treating as empty");
                    None
                }
            };

            let fresh = match scout_facts::extractor::extract(&abs) {
                Ok(f) => f,
                Err(err) => {
                    warn!(path = %rel.display(), error = %err, "parse_error during sync, skipping file");
                    continue;
                }
            };

            let changed = previous
                .as_ref()
                .map(|p| p.checksum != fresh.checksum)
                .unwrap_or(true);

            if let Err(err) = scout_facts::persist::save(&fresh) {
                warn!(path = %rel.display(), error = %err, "failed to persist facts cache, skipping file");
                continue;
            }

            let depends_on = resolve_import_edges(&fresh, &module_paths);
            self.graph.add_or_update(
                SymbolRef::whole_file(rel.to_string_lossy().into_owned()),
                fresh.checksum.clone(),
                depends_on,
            );

            if !changed_only || changed {
                match scout_synth::sync_docs(&self.profiles, &fresh, &self.repo_root, deep).await {
                    Ok(true) => regenerated += 1,
                    Ok(false) => {}
                    Err(err) => warn!(path = %rel.display(), error = %err, "doc synthesis failed"),
                }
            }

            all_facts.push(fresh);
        }

        self.index.rebuild_from_facts(&all_facts)?;
        self.graph
            .save_cache()
            .map_err(|e| ScoutError::IoError(e.to_string()))?;

        info!(files = all_facts.len(), regenerated, "sync complete");
        Ok(regenerated)
    }

    /// `nav(task)` (§6): ranked file list relevant to a natural-language
    /// task. Never fails; may return an empty list.
    pub fn nav(&self, task: &str) -> Vec<PathBuf> {
        scout_context::route_query_to_files(task, "", &self.repo_root, Some(&self.index))
    }

    /// `index.query(query, limit)` (§6): ranked symbol lookup. Never fails.
    pub fn index_query(&self, query: &str, limit: usize) -> Vec<IndexEntry> {
        self.index.query_for_nav(query, limit)
    }
}

/// Walks `repo_root.join(scope)` for `.py` files, skipping VCS/cache/doc
/// directories — the same scope-expansion discipline as
/// `scout_context::routing`, duplicated narrowly here since `sync` walks
/// the whole scope rather than routing a query to a capped subset.
fn collect_py_files(repo_root: &Path, scope: &str) -> Vec<PathBuf> {
    let root = if scope.is_empty() {
        repo_root.to_path_buf()
    } else {
        repo_root.join(scope)
    };
    if !root.exists() {
        return Vec::new();
    }
    if root.is_file() {
        return root
            .strip_prefix(repo_root)
            .map(|p| vec![p.to_path_buf()])
            .unwrap_or_default();
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(&root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        let skip = path.components().any(|c| {
            matches!(
                c.as_os_str().to_str(),
                Some("__pycache__") | Some(".git") | Some(".docs") | Some(".scout")
            )
        });
        if skip {
            continue;
        }
        if let Ok(rel) = path.strip_prefix(repo_root) {
            out.push(rel.to_path_buf());
        }
    }
    out.sort();
    out
}

/// Maps a module's importable stem (file name minus extension, e.g. `foo`
/// for `pkg/foo.py`) to its relative path, so `resolve_import_edges` can
/// turn `imports: {"foo"}` into a graph edge without a full Python import
/// resolver (noted as an Open Question resolution in DESIGN.md).
fn build_module_path_index(files: &[PathBuf]) -> HashMap<String, PathBuf> {
    let mut map = HashMap::new();
    for f in files {
        if let Some(stem) = f.file_stem().and_then(|s| s.to_str()) {
            map.entry(stem.to_string()).or_insert_with(|| f.clone());
        }
    }
    map
}

fn resolve_import_edges(
    facts: &ModuleFacts,
    module_paths: &HashMap<String, PathBuf>,
) -> BTreeSet<SymbolRef> {
    facts
        .imports
        .iter()
        .filter_map(|name| {
            let leaf = name.rsplit('.').next().unwrap_or(name);
            module_paths
                .get(leaf)
                .map(|p| SymbolRef::whole_file(p.to_string_lossy().into_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_facts::SymbolKind;
    use std::collections::BTreeSet as BSet;

    #[test]
    fn collect_py_files_skips_cache_and_vcs_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "").unwrap();
        std::fs::create_dir_all(dir.path().join("__pycache__")).unwrap();
        std::fs::write(dir.path().join("__pycache__/a.pyc.py"), "").unwrap();

        let files = collect_py_files(dir.path(), "");
        assert_eq!(files, vec![PathBuf::from("a.py")]);
    }

    #[test]
    fn module_path_index_keys_by_file_stem() {
        let files = vec![PathBuf::from("pkg/foo.py"), PathBuf::from("bar.py")];
        let index = build_module_path_index(&files);
        assert_eq!(index.get("foo"), Some(&PathBuf::from("pkg/foo.py")));
        assert_eq!(index.get("bar"), Some(&PathBuf::from("bar.py")));
    }

    #[test]
    fn resolve_import_edges_maps_known_imports_to_refs() {
        let mut facts = ModuleFacts {
            path: "a.py".to_string(),
            symbols: vec![(
                "f".to_string(),
                scout_facts::SymbolFact::new(SymbolKind::Function, "f", 1),
            )],
            control_flow: Vec::new(),
            imports: BSet::new(),
            module_docstring: None,
            checksum: String::new(),
        };
        facts.imports.insert("bar".to_string());
        facts.imports.insert("unknown_module".to_string());

        let mut module_paths = HashMap::new();
        module_paths.insert("bar".to_string(), PathBuf::from("bar.py"));

        let edges = resolve_import_edges(&facts, &module_paths);
        assert_eq!(edges.len(), 1);
        assert!(edges.contains(&SymbolRef::whole_file("bar.py")));
    }
}
