//! Deterministic grounding verification (§4.4): every identifier-shaped
//! claim in a compressed brief must trace back to the input facts (or raw
//! TLDR context), with no second LLM call involved.

use std::collections::BTreeSet;

use regex::Regex;
use scout_facts::ModuleFacts;

/// Minimum fraction of candidate terms that must be traceable to source
/// material for a brief to count as grounded.
const GROUNDING_THRESHOLD: f64 = 0.6;

fn candidate_terms(brief: &str) -> Vec<String> {
    let re = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap();
    re.find_iter(brief)
        .map(|m| m.as_str())
        .filter(|w| w.len() >= 4 && (w.contains('_') || w.chars().any(|c| c.is_ascii_uppercase())))
        .map(str::to_string)
        .collect()
}

fn fact_terms(facts: &ModuleFacts) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    for (name, fact) in &facts.symbols {
        terms.insert(name.clone());
        if let Some(value) = &fact.value {
            terms.insert(value.clone());
        }
        if let Some(sig) = &fact.signature {
            terms.insert(sig.clone());
        }
        if let Some(parent) = &fact.parent {
            terms.insert(parent.clone());
        }
    }
    terms.extend(facts.imports.iter().cloned());
    terms
}

/// Result of checking one brief against its source material.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundingReport {
    pub score: f64,
    pub ungrounded_terms: Vec<String>,
}

impl GroundingReport {
    pub fn is_grounded(&self) -> bool {
        self.score >= GROUNDING_THRESHOLD
    }
}

/// Checks `brief`'s identifier-shaped claims against `facts` and, if
/// given, `raw_tldr_context` as a secondary source. A brief with no
/// candidate terms at all is trivially grounded (pure prose summary).
pub fn verify_grounding(
    brief: &str,
    facts: Option<&ModuleFacts>,
    raw_tldr_context: Option<&str>,
) -> GroundingReport {
    let candidates = candidate_terms(brief);
    if candidates.is_empty() {
        return GroundingReport {
            score: 1.0,
            ungrounded_terms: Vec::new(),
        };
    }

    let known = facts.map(fact_terms).unwrap_or_default();
    let context = raw_tldr_context.unwrap_or("");

    let mut ungrounded = Vec::new();
    for term in &candidates {
        let found = known.contains(term) || context.contains(term.as_str());
        if !found {
            ungrounded.push(term.clone());
        }
    }

    let score = 1.0 - (ungrounded.len() as f64 / candidates.len() as f64);
    GroundingReport {
        score,
        ungrounded_terms: ungrounded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_facts::{SymbolFact, SymbolKind};

    fn facts_with(names: &[&str]) -> ModuleFacts {
        ModuleFacts {
            path: "a.py".to_string(),
            symbols: names
                .iter()
                .map(|n| (n.to_string(), SymbolFact::new(SymbolKind::Function, *n, 1)))
                .collect(),
            control_flow: Vec::new(),
            imports: Default::default(),
            module_docstring: None,
            checksum: String::new(),
        }
    }

    #[test]
    fn brief_with_no_identifiers_is_trivially_grounded() {
        let report = verify_grounding("This module handles requests.", None, None);
        assert!(report.is_grounded());
    }

    #[test]
    fn brief_referencing_known_symbol_is_grounded() {
        let facts = facts_with(&["validate_and_compress"]);
        let report = verify_grounding(
            "The validate_and_compress function runs the gate loop.",
            Some(&facts),
            None,
        );
        assert!(report.is_grounded());
        assert!(report.ungrounded_terms.is_empty());
    }

    #[test]
    fn brief_inventing_a_symbol_is_not_grounded() {
        let facts = facts_with(&["validate_and_compress"]);
        let report = verify_grounding(
            "The nonexistent_fabricated_helper does the real work.",
            Some(&facts),
            None,
        );
        assert!(!report.is_grounded());
        assert!(report
            .ungrounded_terms
            .contains(&"nonexistent_fabricated_helper".to_string()));
    }

    #[test]
    fn raw_tldr_context_also_counts_as_grounding_source() {
        let report = verify_grounding(
            "MiddleManagerGate enforces the confidence threshold.",
            None,
            Some("MiddleManagerGate lives in scout-gate."),
        );
        assert!(report.is_grounded());
    }
}
