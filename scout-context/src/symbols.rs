//! `hydrate_symbols` (§4.3): tiered prose assembly for the synthesis path.
//!
//! Always loads `.tldr.md` per unique file; `.deep.md` is loaded only when
//! the same file is enqueued at two distinct BFS depths — the "signal of
//! centrality" spec.md calls for. Hard-capped at `max_tokens` via FIFO
//! discard (§4.3, S6).

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};

use scout_facts::SymbolRef;
use scout_graph::DependencyGraph;

use crate::facts::deps_for_ref;
use crate::tokens::{estimate_tokens, truncate_to_tokens};

/// Loads `<file>.tldr.md`, preferring the local `.docs/` sidecar next to
/// the source file, falling back to the central `docs/livingDoc/` mirror.
/// Returns an empty string when neither exists — best-effort, never fails.
fn load_tldr(repo_root: &Path, rel_path: &Path) -> String {
    load_doc(repo_root, rel_path, "tldr")
}

fn load_deep(repo_root: &Path, rel_path: &Path) -> String {
    load_doc(repo_root, rel_path, "deep")
}

fn load_doc(repo_root: &Path, rel_path: &Path, tier: &str) -> String {
    let full = repo_root.join(rel_path);
    let Some(file_name) = full.file_name() else {
        return String::new();
    };

    if let Some(parent) = full.parent() {
        let local = parent.join(".docs").join(format!(
            "{}.{tier}.md",
            file_name.to_string_lossy()
        ));
        if let Ok(text) = std::fs::read_to_string(&local) {
            return text.trim().to_string();
        }
    }

    if let Some(parent_rel) = rel_path.parent() {
        let central: PathBuf = repo_root.join("docs").join("livingDoc").join(parent_rel).join(
            format!("{}.{tier}.md", file_name.to_string_lossy()),
        );
        if let Ok(text) = std::fs::read_to_string(&central) {
            return text.trim().to_string();
        }
    }

    String::new()
}

/// Tiered prose assembly (§4.3 `hydrate_symbols`). BFS through the
/// dependency graph; `.tldr.md` loads for every unique file seen, `.deep.md`
/// loads additionally once a file has been enqueued at 2+ distinct depths.
pub fn hydrate_symbols(
    seeds: &[SymbolRef],
    deps_graph: &DependencyGraph,
    repo_root: &Path,
    max_depth: u32,
    max_tokens: usize,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut token_count = 0usize;

    let mut queue: VecDeque<(SymbolRef, u32)> = VecDeque::new();
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut seen_files: BTreeSet<String> = BTreeSet::new();
    let mut depths_seen: HashMap<String, BTreeSet<u32>> = HashMap::new();

    for seed in seeds {
        if visited.insert(seed.to_string()) {
            queue.push_back((seed.clone(), 0));
        }
    }

    while let Some((ref_, depth)) = queue.pop_front() {
        if token_count >= max_tokens {
            break;
        }

        let file_key = ref_.path.clone();
        let depths = depths_seen.entry(file_key.clone()).or_default();
        depths.insert(depth);
        let centrality_signal = depths.len() >= 2;

        if seen_files.insert(file_key.clone()) {
            let tldr = load_tldr(repo_root, Path::new(&ref_.path));
            if !tldr.is_empty() {
                let part = format!("## {ref_}\n{tldr}");
                token_count += estimate_tokens(&part);
                parts.push(part);
            }
        }

        if centrality_signal {
            let deep = load_deep(repo_root, Path::new(&ref_.path));
            if !deep.is_empty() {
                let part = format!("## {ref_} (deep)\n{deep}");
                token_count += estimate_tokens(&part);
                parts.push(part);
            }
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

    if token_count > max_tokens {
        truncate_to_tokens(&mut parts, max_tokens);
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet as BSet;

    fn write_tldr(dir: &Path, rel: &str, body: &str) {
        let full = dir.join(rel);
        let docs = full.parent().unwrap().join(".docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(
            docs.join(format!("{}.tldr.md", full.file_name().unwrap().to_string_lossy())),
            body,
        )
        .unwrap();
    }

    #[test]
    fn loads_local_tldr_for_each_unique_file() {
        let dir = tempfile::tempdir().unwrap();
        write_tldr(dir.path(), "a.py", "Summary of a.");

        let graph = DependencyGraph::new();
        let out = hydrate_symbols(
            &[SymbolRef::whole_file("a.py")],
            &graph,
            dir.path(),
            2,
            1000,
        );
        assert!(out.contains("Summary of a."));
    }

    #[test]
    fn falls_back_to_central_mirror_when_local_docs_missing() {
        let dir = tempfile::tempdir().unwrap();
        let central = dir.path().join("docs").join("livingDoc");
        std::fs::create_dir_all(&central).unwrap();
        std::fs::write(central.join("a.py.tldr.md"), "Central summary.").unwrap();
        std::fs::write(dir.path().join("a.py"), "").unwrap();

        let graph = DependencyGraph::new();
        let out = hydrate_symbols(
            &[SymbolRef::whole_file("a.py")],
            &graph,
            dir.path(),
            2,
            1000,
        );
        assert!(out.contains("Central summary."));
    }

    #[test]
    fn missing_docs_yield_empty_string_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let graph = DependencyGraph::new();
        let out = hydrate_symbols(
            &[SymbolRef::whole_file("nope.py")],
            &graph,
            dir.path(),
            2,
            1000,
        );
        assert_eq!(out, "");
    }

    #[test]
    fn token_cap_truncates_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        write_tldr(dir.path(), "a.py", &"x".repeat(800));
        write_tldr(dir.path(), "b.py", &"y".repeat(800));

        let mut graph = DependencyGraph::new();
        let a = SymbolRef::whole_file("a.py");
        let b = SymbolRef::whole_file("b.py");
        graph.add_or_update(a.clone(), "h", BSet::from([b.clone()]));

        let out = hydrate_symbols(&[a], &graph, dir.path(), 2, 150);
        assert!(out.len() < 1700);
    }
}
