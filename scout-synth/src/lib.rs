//! Doc Synthesizer (§4.2.1): turns extracted [`ModuleFacts`] into
//! `.tldr.md` / `.deep.md` living docs via a single constrained LLM call
//! against the flash tier. Never reads source text directly — synthesis
//! is grounded in already-extracted facts, same as the gate's grounding
//! discipline in `scout-gate`.

pub mod error;

use std::path::{Path, PathBuf};

use scout_facts::ModuleFacts;
use scout_llm::LlmServiceProfiles;
use tracing::{debug, info, warn};

pub use error::SynthError;

const TLDR_SYSTEM_PROMPT: &str =
    "You write short, plain-prose summaries of source modules from a list of extracted facts. Never invent symbols not in the fact list.";
const DEEP_SYSTEM_PROMPT: &str =
    "You write structural walkthroughs of source modules (control flow, raise sites, guard conditions) from a list of extracted facts. Never invent symbols not in the fact list.";
const TLDR_MAX_TOKENS: u32 = 256;
const DEEP_MAX_TOKENS: u32 = 768;

fn checksum_marker(checksum: &str) -> String {
    format!("<!-- checksum: {checksum} -->")
}

/// Reads the checksum embedded in an existing doc file, if any, so
/// `sync_docs` can skip regenerating docs for an unchanged module.
fn embedded_checksum(doc: &str) -> Option<&str> {
    let line = doc.lines().find(|l| l.starts_with("<!-- checksum: "))?;
    line.strip_prefix("<!-- checksum: ")?.strip_suffix(" -->")
}

/// Renders the fact list as the grounding material for both prompts —
/// the only input the LLM ever sees, never raw source.
fn render_facts_for_prompt(facts: &ModuleFacts) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Module: {}", facts.path));
    if let Some(doc) = &facts.module_docstring {
        lines.push(format!("Docstring: {doc}"));
    }
    if !facts.imports.is_empty() {
        lines.push(format!(
            "Imports: {}",
            facts.imports.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    for (name, fact) in &facts.symbols {
        let sig = fact.signature.as_deref().unwrap_or("");
        lines.push(format!(
            "- {:?} {name}{sig} (defined_at={})",
            fact.kind, fact.defined_at
        ));
    }
    for (scope, cf) in &facts.control_flow {
        lines.push(format!(
            "Control flow in {scope}: raises={:?} guards={:?} loops={}",
            cf.raise_sites, cf.guard_conditions, cf.loop_count
        ));
    }
    lines.join("\n")
}

/// Produces a ≈3-5 sentence plain-prose summary of the module's purpose
/// and public surface (§4.2.1 tldr prompt shape).
pub async fn synthesize_tldr(
    profiles: &LlmServiceProfiles,
    facts: &ModuleFacts,
) -> Result<String, SynthError> {
    let material = render_facts_for_prompt(facts);
    let prompt = format!(
        "Summarize this module's purpose and public surface in 3-5 plain-prose sentences, grounded only in the facts below:\n\n{material}"
    );
    let call = profiles
        .call_flash(&prompt, Some(TLDR_SYSTEM_PROMPT), Some(TLDR_MAX_TOKENS))
        .await?;
    let mut body = call.content.trim().to_string();
    body.push('\n');
    body.push_str(&checksum_marker(&facts.checksum));
    body.push('\n');
    Ok(body)
}

/// Produces a longer structural walkthrough (control flow, raise sites,
/// notable guard conditions) — only invoked when a caller requests
/// deep-tier sync (§6 `sync --deep`).
pub async fn synthesize_deep(
    profiles: &LlmServiceProfiles,
    facts: &ModuleFacts,
) -> Result<String, SynthError> {
    let material = render_facts_for_prompt(facts);
    let prompt = format!(
        "Write a structural walkthrough of this module: control flow, raise sites, and notable guard conditions, grounded only in the facts below:\n\n{material}"
    );
    let call = profiles
        .call_flash(&prompt, Some(DEEP_SYSTEM_PROMPT), Some(DEEP_MAX_TOKENS))
        .await?;
    let mut body = call.content.trim().to_string();
    body.push('\n');
    body.push_str(&checksum_marker(&facts.checksum));
    body.push('\n');
    Ok(body)
}

fn atomic_write(dest: &Path, contents: &str) -> Result<(), SynthError> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SynthError::Io {
            path: parent.to_string_lossy().to_string(),
            source: e,
        })?;
    }
    let tmp = dest.with_extension("md.tmp");
    std::fs::write(&tmp, contents).map_err(|e| SynthError::Io {
        path: tmp.to_string_lossy().to_string(),
        source: e,
    })?;
    std::fs::rename(&tmp, dest).map_err(|e| SynthError::Io {
        path: dest.to_string_lossy().to_string(),
        source: e,
    })?;
    Ok(())
}

fn local_doc_path(repo_root: &Path, rel_path: &Path, tier: &str) -> Option<PathBuf> {
    let parent = rel_path.parent()?;
    let file_name = rel_path.file_name()?;
    Some(
        repo_root
            .join(parent)
            .join(".docs")
            .join(format!("{}.{tier}.md", file_name.to_string_lossy())),
    )
}

fn central_doc_path(repo_root: &Path, rel_path: &Path, tier: &str) -> Option<PathBuf> {
    let parent = rel_path.parent()?;
    let file_name = rel_path.file_name()?;
    Some(
        repo_root
            .join("docs")
            .join("livingDoc")
            .join(parent)
            .join(format!("{}.{tier}.md", file_name.to_string_lossy())),
    )
}

/// Returns `true` if the local `.tldr.md` sidecar already embeds
/// `facts.checksum` — sync should skip this file at zero LLM cost.
fn is_up_to_date(repo_root: &Path, rel_path: &Path, checksum: &str) -> bool {
    let Some(local) = local_doc_path(repo_root, rel_path, "tldr") else {
        return false;
    };
    match std::fs::read_to_string(&local) {
        Ok(existing) => embedded_checksum(&existing) == Some(checksum),
        Err(_) => false,
    }
}

/// Writes both tiers for one module to `<parent>/.docs/<file>.{tldr,deep}.md`
/// and mirrors the same content to `docs/livingDoc/<rel>/<file>.{tldr,deep}.md`,
/// both via atomic temp-file-then-rename (§4.2.1, §6). Skips the LLM
/// entirely when the on-disk doc already embeds the current checksum.
/// `deep` controls whether the `.deep.md` tier is generated this run.
pub async fn sync_docs(
    profiles: &LlmServiceProfiles,
    facts: &ModuleFacts,
    repo_root: &Path,
    deep: bool,
) -> Result<bool, SynthError> {
    let rel_path = Path::new(&facts.path);

    if is_up_to_date(repo_root, rel_path, &facts.checksum) {
        debug!(path = %facts.path, "doc already current, skipping synthesis");
        return Ok(false);
    }

    let tldr = synthesize_tldr(profiles, facts).await?;
    write_tier(repo_root, rel_path, "tldr", &tldr)?;

    if deep {
        let deep_doc = synthesize_deep(profiles, facts).await?;
        write_tier(repo_root, rel_path, "deep", &deep_doc)?;
    }

    info!(path = %facts.path, deep, "synthesized living docs");
    Ok(true)
}

fn write_tier(repo_root: &Path, rel_path: &Path, tier: &str, body: &str) -> Result<(), SynthError> {
    if let Some(local) = local_doc_path(repo_root, rel_path, tier) {
        atomic_write(&local, body)?;
    }
    if let Some(central) = central_doc_path(repo_root, rel_path, tier) {
        atomic_write(&central, body)?;
    } else {
        warn!(path = %rel_path.display(), "module has no parent component, skipping central mirror");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_facts::{SymbolFact, SymbolKind};
    use std::collections::BTreeSet;

    fn facts(path: &str, checksum: &str) -> ModuleFacts {
        ModuleFacts {
            path: path.to_string(),
            symbols: vec![(
                "foo".to_string(),
                SymbolFact::new(SymbolKind::Function, "foo", 1),
            )],
            control_flow: Vec::new(),
            imports: BTreeSet::new(),
            module_docstring: Some("does a thing".to_string()),
            checksum: checksum.to_string(),
        }
    }

    #[test]
    fn embedded_checksum_round_trips_through_marker() {
        let marker = checksum_marker("abc123");
        assert_eq!(embedded_checksum(&marker), Some("abc123"));
    }

    #[test]
    fn embedded_checksum_is_none_for_unmarked_doc() {
        assert_eq!(embedded_checksum("just some prose"), None);
    }

    #[test]
    fn render_facts_includes_docstring_and_symbols() {
        let f = facts("a.py", "h1");
        let rendered = render_facts_for_prompt(&f);
        assert!(rendered.contains("does a thing"));
        assert!(rendered.contains("foo"));
    }

    #[test]
    fn up_to_date_check_is_false_when_no_doc_exists() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_up_to_date(dir.path(), Path::new("a.py"), "h1"));
    }

    #[test]
    fn up_to_date_check_true_when_checksum_matches() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join(".docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("a.py.tldr.md"), checksum_marker("h1")).unwrap();
        assert!(is_up_to_date(dir.path(), Path::new("a.py"), "h1"));
    }

    #[test]
    fn up_to_date_check_false_when_checksum_differs() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join(".docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("a.py.tldr.md"), checksum_marker("h1")).unwrap();
        assert!(!is_up_to_date(dir.path(), Path::new("a.py"), "h2"));
    }
}
