//! `hydrate_facts` (§4.3): BFS over the dependency graph, loading each
//! visited node's `.facts.json` and merging into one combined `ModuleFacts`.
//! Structured facts only — this module never reads prose.

use std::collections::{BTreeSet, VecDeque};
use std::path::Path;

use scout_facts::checksum::compute_checksum;
use scout_facts::{ModuleFacts, SymbolRef};
use scout_graph::DependencyGraph;

/// Merges `other` into `target`: symbols/control-flow appended in the order
/// encountered (duplicates across files are fine — names are only unique
/// within one file's `ModuleFacts`), imports unioned, docstring kept from
/// whichever module set it first.
fn merge_into(target: &mut ModuleFacts, other: ModuleFacts) {
    target.symbols.extend(other.symbols);
    target.control_flow.extend(other.control_flow);
    target.imports.extend(other.imports);
    if target.module_docstring.is_none() {
        target.module_docstring = other.module_docstring;
    }
}

/// Dependencies for `ref_`, with file-level refs (empty `symbol`)
/// aggregating the `depends_on` of every node whose key is under that
/// file, matching the original's `_get_deps_for_ref`.
pub(crate) fn deps_for_ref(ref_: &SymbolRef, graph: &DependencyGraph) -> Vec<SymbolRef> {
    if let Some(node) = graph.get(ref_) {
        return node.depends_on.iter().cloned().collect();
    }
    if ref_.symbol.is_empty() {
        let prefix = format!("{}::", ref_.path);
        let mut deps: BTreeSet<SymbolRef> = BTreeSet::new();
        for (key, node) in graph.iter_nodes() {
            if key.starts_with(&prefix) {
                deps.extend(node.depends_on.iter().cloned());
            }
        }
        return deps.into_iter().collect();
    }
    Vec::new()
}

/// BFS over `deps_graph` from `seeds`, loading each visited node's
/// `<file>.facts.json` from disk under `repo_root`, merged into one
/// combined `ModuleFacts`. Halts when the BFS is exhausted or the merged
/// symbol count reaches `max_facts`.
pub fn hydrate_facts(
    seeds: &[SymbolRef],
    deps_graph: &DependencyGraph,
    repo_root: &Path,
    max_facts: usize,
    max_depth: u32,
) -> ModuleFacts {
    let mut combined = ModuleFacts {
        path: "<hydrated>".to_string(),
        symbols: Vec::new(),
        control_flow: Vec::new(),
        imports: BTreeSet::new(),
        module_docstring: None,
        checksum: String::new(),
    };

    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<(SymbolRef, u32)> = VecDeque::new();
    for seed in seeds {
        if visited.insert(seed.to_string()) {
            queue.push_back((seed.clone(), 0));
        }
    }

    while let Some((ref_, depth)) = queue.pop_front() {
        if combined.symbols.len() >= max_facts {
            break;
        }

        let source_path = repo_root.join(&ref_.path);
        if let Ok(Some(loaded)) = scout_facts::persist::load(&source_path) {
            merge_into(&mut combined, loaded);
        }

        if depth < max_depth {
            for dep in deps_for_ref(&ref_, deps_graph) {
                let key = dep.to_string();
                if visited.insert(key) {
                    queue.push_back((dep, depth + 1));
                }
            }
        }
    }

    combined.checksum = compute_checksum(&combined);
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_facts::persist;
    use scout_facts::{SymbolFact, SymbolKind};
    use std::collections::BTreeSet as BSet;

    fn write_facts(dir: &Path, rel: &str, symbol: &str) -> SymbolRef {
        let full = dir.join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(&full, "").unwrap();

        let facts = ModuleFacts {
            path: full.to_string_lossy().to_string(),
            symbols: vec![(
                symbol.to_string(),
                SymbolFact::new(SymbolKind::Function, symbol, 1),
            )],
            control_flow: Vec::new(),
            imports: BSet::new(),
            module_docstring: None,
            checksum: String::new(),
        };
        persist::save(&facts).unwrap();
        SymbolRef::whole_file(rel)
    }

    #[test]
    fn merges_seed_and_one_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_facts(dir.path(), "a.py", "a_fn");
        let b_ref = write_facts(dir.path(), "b.py", "b_fn");

        let mut graph = DependencyGraph::new();
        graph.add_or_update(a.clone(), "ha", BTreeSet::from([b_ref.clone()]));

        let combined = hydrate_facts(&[a], &graph, dir.path(), 50, 2);
        assert!(combined.symbol("a_fn").is_some());
        assert!(combined.symbol("b_fn").is_some());
    }

    #[test]
    fn respects_max_facts_budget() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_facts(dir.path(), "a.py", "a_fn");
        let b_ref = write_facts(dir.path(), "b.py", "b_fn");

        let mut graph = DependencyGraph::new();
        graph.add_or_update(a.clone(), "ha", BTreeSet::from([b_ref]));

        let combined = hydrate_facts(&[a], &graph, dir.path(), 1, 2);
        assert_eq!(combined.symbols.len(), 1);
    }

    #[test]
    fn missing_facts_file_is_silently_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = SymbolRef::whole_file("does_not_exist.py");
        let graph = DependencyGraph::new();

        let combined = hydrate_facts(&[missing], &graph, dir.path(), 50, 2);
        assert!(combined.symbols.is_empty());
    }
}
