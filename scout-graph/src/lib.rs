//! Persistent, invalidation-aware dependency graph (§4.2): bidirectional
//! symbol edges, one-hop cascade invalidation, and deterministic BFS
//! context packages.

pub mod graph;
pub mod model;

pub use graph::{DependencyGraph, CACHE_VERSION};
pub use model::{DependencyNode, GraphStats, InvalidationReason, TrustMetadata};
