//! Persistent dependency graph (§4.2).
//!
//! Keyed by `str(ref)` (`path::symbol`), this is an in-memory adjacency
//! structure with JSON persistence. All mutation is exclusive to this
//! struct's methods so invariant (iv) — `A ∈ B.depends_on ⇒ B ∈ A.used_by`
//! — can never be violated from outside.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use chrono::Utc;
use scout_facts::SymbolRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{DependencyNode, GraphStats, InvalidationReason, TrustMetadata};

/// Cache format version, bumped whenever the on-disk schema changes.
pub const CACHE_VERSION: u32 = 2;

fn default_cache_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".scout").join("dependency_graph.v2.json")
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    cache_version: u32,
    nodes: BTreeMap<String, DependencyNode>,
}

/// Persistent, invalidation-aware symbol graph (§3 `DependencyGraph`).
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, DependencyNode>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, r: &SymbolRef) -> Option<&DependencyNode> {
        self.nodes.get(&r.to_string())
    }

    /// Iterates every node keyed by `str(ref)`, for callers (e.g. the
    /// context hydrator) that need to aggregate dependencies across a
    /// file-level ref rather than a single symbol.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (&str, &DependencyNode)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Inserts a node or refreshes an existing one (§4.2).
    ///
    /// If `ast_hash` differs from the stored value, the node is marked
    /// invalid with reason `hash_mismatch` and the invalidation cascades
    /// once to everything in its `used_by` set with reason `cascade`.
    /// Bidirectional edges are maintained in both directions (invariant iv).
    pub fn add_or_update(&mut self, r: SymbolRef, ast_hash: impl Into<String>, depends_on: BTreeSet<SymbolRef>) {
        let key = r.to_string();
        let ast_hash = ast_hash.into();

        let hash_changed = self
            .nodes
            .get(&key)
            .is_some_and(|existing| existing.ast_hash != ast_hash);

        // Remove this node from the used_by set of dependencies it no
        // longer has, then add it to the used_by set of its current ones.
        let previous_depends_on = self
            .nodes
            .get(&key)
            .map(|n| n.depends_on.clone())
            .unwrap_or_default();

        for dropped in previous_depends_on.difference(&depends_on) {
            if let Some(dep_node) = self.nodes.get_mut(&dropped.to_string()) {
                dep_node.used_by.remove(&r);
            }
        }
        for added in depends_on.difference(&previous_depends_on) {
            let entry = self
                .nodes
                .entry(added.to_string())
                .or_insert_with(|| DependencyNode::new(added.clone(), String::new()));
            entry.used_by.insert(r.clone());
        }

        let node = self
            .nodes
            .entry(key.clone())
            .or_insert_with(|| DependencyNode::new(r.clone(), ast_hash.clone()));
        node.ast_hash = ast_hash;
        node.depends_on = depends_on;

        if hash_changed {
            node.invalidated_at = Some(Utc::now());
            node.invalidation_reason = Some(InvalidationReason::HashMismatch);
            debug!(symbol = %key, "node invalidated: hash_mismatch");
            self.cascade_invalidate(&r);
        }
    }

    /// Invalidates one node and cascades once (§4.2 `mark_stale`).
    pub fn mark_stale(&mut self, r: &SymbolRef, reason: InvalidationReason) {
        if let Some(node) = self.nodes.get_mut(&r.to_string()) {
            node.invalidated_at = Some(Utc::now());
            node.invalidation_reason = Some(reason);
        }
        self.cascade_invalidate(r);
    }

    /// Propagates invalidation along `used_by` edges starting from `r`.
    /// Each newly-reached node is itself an invalidation event that cascades
    /// one hop further to its own `used_by` set, so the net effect is the
    /// transitive closure — walked with a visited set (guarding cycles)
    /// rather than recursion, matching `get_context_package`'s BFS pattern.
    fn cascade_invalidate(&mut self, r: &SymbolRef) {
        let mut visited: BTreeSet<String> = BTreeSet::new();
        visited.insert(r.to_string());
        let mut queue: VecDeque<SymbolRef> = VecDeque::new();
        queue.push_back(r.clone());

        let mut cascaded = 0usize;
        while let Some(current) = queue.pop_front() {
            let Some(used_by) = self.nodes.get(&current.to_string()).map(|n| n.used_by.clone())
            else {
                continue;
            };
            for dependent in &used_by {
                let key = dependent.to_string();
                if !visited.insert(key.clone()) {
                    continue;
                }
                if let Some(dep_node) = self.nodes.get_mut(&key) {
                    dep_node.invalidated_at = Some(Utc::now());
                    dep_node.invalidation_reason = Some(InvalidationReason::Cascade);
                    cascaded += 1;
                }
                queue.push_back(dependent.clone());
            }
        }
        if cascaded > 0 {
            info!(symbol = %r, cascaded_to = cascaded, "invalidation cascade");
        }
    }

    /// BFS from `seeds`, visiting each node at most once, stopping at depth
    /// `max_depth` inclusive of seeds at depth 0 (§4.2). Returns nodes in
    /// deterministic BFS order: within a level, insertion order of the
    /// adjacency set (`depends_on` ∪ `used_by`, depends_on first).
    pub fn get_context_package(&self, seeds: &[SymbolRef], max_depth: u32) -> Vec<SymbolRef> {
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut order: Vec<SymbolRef> = Vec::new();
        let mut queue: VecDeque<(SymbolRef, u32)> = VecDeque::new();

        for seed in seeds {
            let key = seed.to_string();
            if visited.insert(key) {
                queue.push_back((seed.clone(), 0));
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            order.push(current.clone());
            if depth >= max_depth {
                continue;
            }
            let Some(node) = self.nodes.get(&current.to_string()) else {
                continue;
            };
            for neighbor in node.depends_on.iter().chain(node.used_by.iter()) {
                let key = neighbor.to_string();
                if visited.insert(key) {
                    queue.push_back((neighbor.clone(), depth + 1));
                }
            }
        }

        order
    }

    /// Aggregates trust metadata over `nodes` (§4.2). Empty input yields all
    /// zero/false/empty, never a division error.
    pub fn get_trust_metadata(&self, refs: &[SymbolRef]) -> TrustMetadata {
        if refs.is_empty() {
            return TrustMetadata {
                total_symbols: 0,
                stale_ratio: 0.0,
                invalidation_cascade_triggered: false,
                invalidation_reasons: Vec::new(),
                oldest_invalidation: None,
            };
        }

        let mut stale_count = 0usize;
        let mut cascade_triggered = false;
        let mut reasons: BTreeSet<InvalidationReason> = BTreeSet::new();
        let mut oldest = None;

        for r in refs {
            let Some(node) = self.nodes.get(&r.to_string()) else {
                continue;
            };
            if let Some(reason) = node.invalidation_reason {
                stale_count += 1;
                reasons.insert(reason);
                if reason == InvalidationReason::Cascade {
                    cascade_triggered = true;
                }
            }
            if let Some(at) = node.invalidated_at {
                oldest = Some(match oldest {
                    Some(existing) if existing < at => existing,
                    _ => at,
                });
            }
        }

        TrustMetadata {
            total_symbols: refs.len(),
            stale_ratio: stale_count as f64 / refs.len() as f64,
            invalidation_cascade_triggered: cascade_triggered,
            invalidation_reasons: reasons.into_iter().collect(),
            oldest_invalidation: oldest,
        }
    }

    /// Graph-wide counters (§4.2 `get_stats`). `orphaned` counts nodes whose
    /// source file no longer exists on disk.
    pub fn get_stats(&self) -> GraphStats {
        let total = self.nodes.len();
        let stale = self
            .nodes
            .values()
            .filter(|n| n.invalidation_reason.is_some())
            .count();
        let orphaned = self
            .nodes
            .values()
            .filter(|n| !Path::new(&n.symbol_ref.path).exists())
            .count();

        GraphStats {
            total,
            stale,
            orphaned,
            cache_version: CACHE_VERSION,
        }
    }

    /// Persists to `~/.scout/dependency_graph.v2.json`, atomically via
    /// write-then-rename (§4.2 failure semantics).
    pub fn save_cache(&self) -> std::io::Result<()> {
        self.save_cache_to(&default_cache_path())
    }

    pub fn save_cache_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let cache = CacheFile {
            cache_version: CACHE_VERSION,
            nodes: self.nodes.clone(),
        };
        let json = serde_json::to_vec_pretty(&cache)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;

        debug!(path = %path.display(), nodes = self.nodes.len(), "saved dependency graph cache");
        Ok(())
    }

    /// Loads from `~/.scout/dependency_graph.v2.json`. A missing cache file
    /// yields an empty graph, not an error. A corrupt cache file logs and
    /// also yields an empty graph (§4.2 failure semantics).
    pub fn load_cache() -> Self {
        Self::load_cache_from(&default_cache_path())
    }

    pub fn load_cache_from(path: &Path) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(_) => return Self::new(),
        };
        match serde_json::from_slice::<CacheFile>(&bytes) {
            Ok(cache) => {
                info!(path = %path.display(), nodes = cache.nodes.len(), version = cache.cache_version, "loaded dependency graph cache");
                Self { nodes: cache.nodes }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt dependency graph cache, starting empty");
                Self::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sref(path: &str, symbol: &str) -> SymbolRef {
        SymbolRef::new(path, symbol)
    }

    #[test]
    fn add_or_update_maintains_bidirectional_edges() {
        let mut g = DependencyGraph::new();
        let a = sref("a.py", "foo");
        let b = sref("b.py", "bar");
        g.add_or_update(a.clone(), "hash1", BTreeSet::from([b.clone()]));

        let node_b = g.get(&b).expect("b should exist as a dependency target");
        assert!(node_b.used_by.contains(&a));
    }

    #[test]
    fn changed_hash_invalidates_and_cascades_once() {
        let mut g = DependencyGraph::new();
        let a = sref("a.py", "foo");
        let b = sref("b.py", "bar");
        g.add_or_update(b.clone(), "hashB", BTreeSet::new());
        g.add_or_update(a.clone(), "hash1", BTreeSet::from([b.clone()]));

        // b depends on nothing, a depends on b => b.used_by contains a.
        // Now change b's hash: b should invalidate, and a (in b.used_by)
        // should cascade-invalidate.
        g.add_or_update(b.clone(), "hashB-changed", BTreeSet::new());

        let node_b = g.get(&b).unwrap();
        assert_eq!(node_b.invalidation_reason, Some(InvalidationReason::HashMismatch));
        let node_a = g.get(&a).unwrap();
        assert_eq!(node_a.invalidation_reason, Some(InvalidationReason::Cascade));
    }

    #[test]
    fn cascade_propagates_transitively_through_a_chain() {
        // A -> B -> C (A depends_on B, B depends_on C). Invalidating C must
        // reach both B (direct) and A (transitive), per spec.md S2.
        let mut g = DependencyGraph::new();
        let a = sref("a.py", "foo");
        let b = sref("b.py", "bar");
        let c = sref("c.py", "baz");
        g.add_or_update(c.clone(), "hashC", BTreeSet::new());
        g.add_or_update(b.clone(), "hashB", BTreeSet::from([c.clone()]));
        g.add_or_update(a.clone(), "hashA", BTreeSet::from([b.clone()]));

        g.mark_stale(&c, InvalidationReason::HashMismatch);

        let node_c = g.get(&c).unwrap();
        assert_eq!(node_c.invalidation_reason, Some(InvalidationReason::HashMismatch));
        let node_b = g.get(&b).unwrap();
        assert_eq!(node_b.invalidation_reason, Some(InvalidationReason::Cascade));
        let node_a = g.get(&a).unwrap();
        assert_eq!(node_a.invalidation_reason, Some(InvalidationReason::Cascade));
    }

    #[test]
    fn bfs_respects_max_depth_and_dedupes() {
        let mut g = DependencyGraph::new();
        let a = sref("a.py", "a");
        let b = sref("b.py", "b");
        let c = sref("c.py", "c");
        g.add_or_update(a.clone(), "h", BTreeSet::from([b.clone()]));
        g.add_or_update(b.clone(), "h", BTreeSet::from([c.clone()]));

        let depth0 = g.get_context_package(&[a.clone()], 0);
        assert_eq!(depth0, vec![a.clone()]);

        let depth2 = g.get_context_package(&[a.clone()], 2);
        assert_eq!(depth2.len(), 3);
        assert_eq!(depth2[0], a);
    }

    #[test]
    fn trust_metadata_empty_input_is_all_zero() {
        let g = DependencyGraph::new();
        let meta = g.get_trust_metadata(&[]);
        assert_eq!(meta.total_symbols, 0);
        assert_eq!(meta.stale_ratio, 0.0);
        assert!(!meta.invalidation_cascade_triggered);
    }

    #[test]
    fn save_and_load_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_graph.v2.json");

        let mut g = DependencyGraph::new();
        g.add_or_update(sref("a.py", "a"), "h1", BTreeSet::new());
        g.save_cache_to(&path).unwrap();

        let loaded = DependencyGraph::load_cache_from(&path);
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn missing_cache_file_yields_empty_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.json");
        let loaded = DependencyGraph::load_cache_from(&path);
        assert!(loaded.is_empty());
    }

    #[test]
    fn corrupt_cache_file_yields_empty_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dependency_graph.v2.json");
        std::fs::write(&path, b"not json").unwrap();
        let loaded = DependencyGraph::load_cache_from(&path);
        assert!(loaded.is_empty());
    }
}
