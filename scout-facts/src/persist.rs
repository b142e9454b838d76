//! `.facts.json` persistence (§3 `ModuleFacts` lifecycle, §6 on-disk schema).

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ExtractError;
use crate::model::ModuleFacts;

/// Sidecar path for a source file's cached facts: `<parent>/.docs/<file>.facts.json`
/// (§6 filesystem conventions), mirroring where `scout-synth` writes
/// `.tldr.md`/`.deep.md` for the same module.
pub fn facts_path_for(source_path: &Path) -> PathBuf {
    let file_name = source_path.file_name().unwrap_or_default();
    let mut facts_name = file_name.to_owned();
    facts_name.push(".facts.json");
    match source_path.parent() {
        Some(parent) => parent.join(".docs").join(facts_name),
        None => PathBuf::from(".docs").join(facts_name),
    }
}

/// Writes `facts` to its sidecar path, atomically (write to a temp file,
/// then rename), mirroring the dependency graph's write discipline (§4.2).
pub fn save(facts: &ModuleFacts) -> Result<(), ExtractError> {
    let dest = facts_path_for(Path::new(&facts.path));
    let tmp = dest.with_extension("facts.json.tmp");

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExtractError::Io {
            path: parent.to_string_lossy().to_string(),
            source: e,
        })?;
    }

    let json = serde_json::to_vec_pretty(facts).map_err(|e| ExtractError::Io {
        path: dest.to_string_lossy().to_string(),
        source: std::io::Error::other(e),
    })?;

    std::fs::write(&tmp, json).map_err(|e| ExtractError::Io {
        path: tmp.to_string_lossy().to_string(),
        source: e,
    })?;
    std::fs::rename(&tmp, &dest).map_err(|e| ExtractError::Io {
        path: dest.to_string_lossy().to_string(),
        source: e,
    })?;

    debug!(path = %dest.display(), "wrote facts cache");
    Ok(())
}

/// Loads a previously cached `.facts.json`. Missing file is not an error at
/// this layer — callers that treat it as "cache miss" should check
/// `path.exists()` first; this returns `Ok(None)` either way for convenience.
pub fn load(source_path: &Path) -> Result<Option<ModuleFacts>, ExtractError> {
    let path = facts_path_for(source_path);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(&path).map_err(|e| ExtractError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let facts: ModuleFacts = serde_json::from_slice(&bytes).map_err(|e| ExtractError::Io {
        path: path.to_string_lossy().to_string(),
        source: std::io::Error::other(e),
    })?;
    Ok(Some(facts))
}

/// Re-extracts `source_path` only if its current content checksum differs
/// from the cached one (or no cache exists), writing the refreshed cache.
pub fn extract_if_stale(source_path: &Path) -> Result<ModuleFacts, ExtractError> {
    let fresh = crate::extractor::extract(source_path)?;
    match load(source_path)? {
        Some(cached) if cached.checksum == fresh.checksum => Ok(cached),
        _ => {
            save(&fresh)?;
            Ok(fresh)
        }
    }
}
