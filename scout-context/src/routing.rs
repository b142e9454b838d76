//! `route_query_to_files` (§4.3): combines symbol-index lookup with scope
//! expansion, boosting gate-related queries toward `scout`-path files.

use std::path::{Path, PathBuf};

use regex::Regex;
use scout_index::SymbolIndex;
use walkdir::WalkDir;

const GATE_KEYWORDS: &[&str] = &["gate", "confidence", "hallucination"];
const MAX_FILES: usize = 15;

fn mentions_gate_keyword(query: &str) -> bool {
    let lower = query.to_lowercase();
    GATE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Promotes paths containing `scout` ahead of everything else, preserving
/// relative order within each group (stable partition).
fn boost_scout_paths(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let (scout_first, other): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|p| p.to_string_lossy().to_lowercase().contains("scout"));
    scout_first.into_iter().chain(other).collect()
}

/// Extracts CAPS-like symbol candidates from the query text (class names,
/// `SCREAMING_CASE` constants), used to prioritize files whose cached
/// facts mention them.
fn symbol_candidates(query: &str) -> Vec<String> {
    let re = Regex::new(r"[A-Z][a-z]+(?:[A-Z][a-z]+)*|[A-Z][A-Z0-9_]{2,}").unwrap();
    re.find_iter(query).map(|m| m.as_str().to_string()).collect()
}

/// Walks `scope_root` for source files, skipping VCS/build/test noise.
fn walk_scope(repo_root: &Path, scope: &str) -> Vec<PathBuf> {
    let scope_path = repo_root.join(scope);
    if !scope_path.exists() {
        return Vec::new();
    }
    if scope_path.is_file() {
        return match scope_path.strip_prefix(repo_root) {
            Ok(rel) => vec![rel.to_path_buf()],
            Err(_) => Vec::new(),
        };
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(&scope_path)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        let components_skip = path.components().any(|c| {
            matches!(c.as_os_str().to_str(), Some("__pycache__") | Some(".git"))
        });
        if components_skip {
            continue;
        }
        if let Ok(rel) = path.strip_prefix(repo_root) {
            let rel_str = rel.to_string_lossy().to_lowercase();
            // Skip test files unless the top-level component is itself `tests`.
            let top_is_tests = rel
                .components()
                .next()
                .map(|c| c.as_os_str() == "tests")
                .unwrap_or(false);
            if rel_str.contains("test") && !top_is_tests {
                continue;
            }
            out.push(rel.to_path_buf());
        }
    }
    out.sort();
    out
}

/// Prioritizes files whose cached `.facts.json` mentions a CAPS-like symbol
/// candidate extracted from the query.
fn prioritize_by_symbol_mentions(repo_root: &Path, files: Vec<PathBuf>, query: &str) -> Vec<PathBuf> {
    let candidates = symbol_candidates(query);
    if candidates.is_empty() {
        return files;
    }

    let mut remaining = files;
    let mut prioritized: Vec<PathBuf> = Vec::new();
    for sym in candidates.iter().take(3) {
        let mut next_remaining = Vec::new();
        for f in remaining {
            let facts_path = repo_root
                .join(f.parent().unwrap_or(Path::new("")))
                .join(".docs")
                .join(format!("{}.facts.json", f.file_name().unwrap_or_default().to_string_lossy()));
            let matched = std::fs::read_to_string(&facts_path)
                .map(|text| text.contains(sym.as_str()))
                .unwrap_or(false);
            if matched {
                prioritized.push(f);
            } else {
                next_remaining.push(f);
            }
        }
        remaining = next_remaining;
    }

    let mut seen = std::collections::BTreeSet::new();
    prioritized.retain(|p| seen.insert(p.clone()));
    prioritized.into_iter().chain(remaining).collect()
}

/// Routes a natural-language query to relevant files (§4.3). Tries the
/// symbol index first (cheap, targeted); falls back to scope expansion.
/// Gate-related keywords boost `scout`-path files. Capped at 15 files.
pub fn route_query_to_files(
    query: &str,
    scope: &str,
    repo_root: &Path,
    index: Option<&SymbolIndex>,
) -> Vec<PathBuf> {
    if let Some(index) = index {
        let hits = index.query_for_nav(query, 5);
        if !hits.is_empty() {
            let mut files: Vec<PathBuf> = Vec::new();
            let mut seen = std::collections::BTreeSet::new();
            for hit in hits {
                let candidate = repo_root.join(&hit.file);
                if candidate.exists()
                    && candidate.extension().and_then(|e| e.to_str()) == Some("py")
                    && seen.insert(hit.file.clone())
                {
                    files.push(PathBuf::from(hit.file));
                }
            }
            if !files.is_empty() {
                if mentions_gate_keyword(query) {
                    files = boost_scout_paths(files);
                }
                files.truncate(5);
                return files;
            }
        }
    }

    let all_files = walk_scope(repo_root, scope);
    if all_files.is_empty() {
        return Vec::new();
    }

    if mentions_gate_keyword(query) {
        let boosted = boost_scout_paths(all_files);
        let mut scout_files: Vec<PathBuf> = boosted
            .iter()
            .filter(|p| p.to_string_lossy().to_lowercase().contains("scout"))
            .cloned()
            .collect();
        let other_files: Vec<PathBuf> = boosted
            .iter()
            .filter(|p| !p.to_string_lossy().to_lowercase().contains("scout"))
            .cloned()
            .collect();
        scout_files = prioritize_by_symbol_mentions(repo_root, scout_files, query);
        let mut combined: Vec<PathBuf> = scout_files.into_iter().chain(other_files).collect();
        combined.truncate(MAX_FILES);
        return combined;
    }

    let prioritized = prioritize_by_symbol_mentions(repo_root, all_files, query);
    prioritized.into_iter().take(10).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_scope_expansion_when_index_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "").unwrap();
        std::fs::write(dir.path().join("b.py"), "").unwrap();

        let files = route_query_to_files("how does this work", "", dir.path(), None);
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn gate_keyword_boosts_scout_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("scout")).unwrap();
        std::fs::write(dir.path().join("scout/gate.py"), "").unwrap();
        std::fs::write(dir.path().join("other.py"), "").unwrap();

        let files = route_query_to_files("how does the gate confidence work", "", dir.path(), None);
        assert!(files[0].to_string_lossy().contains("scout"));
    }

    #[test]
    fn test_files_are_skipped_unless_under_tests_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test_foo.py"), "").unwrap();
        std::fs::write(dir.path().join("real.py"), "").unwrap();

        let files = route_query_to_files("anything", "", dir.path(), None);
        assert_eq!(files, vec![PathBuf::from("real.py")]);
    }

    #[test]
    fn missing_scope_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = route_query_to_files("q", "nonexistent/scope", dir.path(), None);
        assert!(files.is_empty());
    }
}
