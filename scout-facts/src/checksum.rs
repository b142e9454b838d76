//! Content-addressed checksum for [`crate::model::ModuleFacts`].
//!
//! Grounded on the teacher's `hash_content` (FNV-1a 64-bit, dependency-free);
//! the canonical form re-sorts `symbols` by `defined_at` and renders every
//! set as a sorted array before hashing, per the checksum rule in §4.1 —
//! independent from the insertion-order the field keeps for consumers.

use serde::Serialize;
use serde_json::Value;

use crate::model::{ControlFlowFact, ModuleFacts, SymbolFact};

/// FNV-1a 64-bit content hash as a lowercase hex string.
pub fn hash_content(bytes: &[u8]) -> String {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{:016x}", hash)
}

#[derive(Serialize)]
struct CanonicalFacts<'a> {
    path: &'a str,
    symbols: Vec<(&'a str, &'a SymbolFact)>,
    control_flow: Vec<(&'a str, &'a ControlFlowFact)>,
    imports: Vec<&'a str>,
    module_docstring: &'a Option<String>,
}

/// Computes the checksum over the canonical form described in §4.1: symbols
/// ordered by `defined_at`, `used_at`/`imports` as sorted arrays, `checksum`
/// itself excluded from the hashed payload.
pub fn compute_checksum(facts: &ModuleFacts) -> String {
    let mut symbols: Vec<(&str, &SymbolFact)> = facts
        .symbols
        .iter()
        .map(|(name, fact)| (name.as_str(), fact))
        .collect();
    symbols.sort_by_key(|(_, fact)| fact.defined_at);

    let canonical = CanonicalFacts {
        path: &facts.path,
        symbols,
        control_flow: facts
            .control_flow
            .iter()
            .map(|(name, cf)| (name.as_str(), cf))
            .collect(),
        imports: facts.imports.iter().map(String::as_str).collect(),
        module_docstring: &facts.module_docstring,
    };

    // serde_json serializes struct fields in declaration order and BTreeSet
    // contents in sorted order already; sort map keys defensively in case a
    // future field becomes a HashMap.
    let value = serde_json::to_value(&canonical).expect("canonical facts always serialize");
    let canonical_bytes = canonical_json_bytes(&value);
    hash_content(&canonical_bytes)
}

fn canonical_json_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Vec::new();
            out.push(b'{');
            for (i, k) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(format!("{k:?}").as_bytes());
                out.push(b':');
                out.extend(canonical_json_bytes(&map[*k]));
            }
            out.push(b'}');
            out
        }
        Value::Array(items) => {
            let mut out = Vec::new();
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend(canonical_json_bytes(item));
            }
            out.push(b']');
            out
        }
        other => serde_json::to_vec(other).expect("scalar json value always serializes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SymbolFact, SymbolKind};
    use std::collections::BTreeSet;

    fn sample() -> ModuleFacts {
        let mut symbols = Vec::new();
        symbols.push((
            "foo".to_string(),
            SymbolFact::new(SymbolKind::Function, "foo", 3),
        ));
        ModuleFacts {
            path: "a.py".to_string(),
            symbols,
            control_flow: Vec::new(),
            imports: BTreeSet::new(),
            module_docstring: None,
            checksum: String::new(),
        }
    }

    #[test]
    fn checksum_is_stable_for_identical_content() {
        let a = sample();
        let b = sample();
        assert_eq!(compute_checksum(&a), compute_checksum(&b));
    }

    #[test]
    fn checksum_is_independent_of_insertion_order_once_sorted_by_defined_at() {
        let mut a = sample();
        a.symbols.push((
            "bar".to_string(),
            SymbolFact::new(SymbolKind::Function, "bar", 10),
        ));

        let mut b = sample();
        // Insert in reverse order; checksum sorts by defined_at so both match.
        let foo = b.symbols.remove(0);
        b.symbols.push((
            "bar".to_string(),
            SymbolFact::new(SymbolKind::Function, "bar", 10),
        ));
        b.symbols.push(foo);

        assert_eq!(compute_checksum(&a), compute_checksum(&b));
    }

    #[test]
    fn checksum_changes_when_a_value_changes() {
        let a = sample();
        let mut b = sample();
        b.symbols[0].1.defined_at = 99;
        assert_ne!(compute_checksum(&a), compute_checksum(&b));
    }
}
