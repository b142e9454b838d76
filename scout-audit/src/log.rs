//! Append-only JSONL audit log (§4.7, §6 `$REPO/.scout/audit.jsonl`).
//!
//! Writer is not required to be durable across power loss but must be
//! atomic per line: each call either appends one full `{...}\n` record or
//! nothing. There is no cross-request lock — concurrent readers are safe,
//! and a single-writer process is assumed (§5).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::AuditError;
use crate::event::AuditEvent;

/// Append-only JSONL event store.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `$REPO/.scout/audit.jsonl` (§6).
    pub fn for_repo(repo_root: &Path) -> Self {
        Self::new(repo_root.join(".scout").join("audit.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes `event` fully before writing, then appends it as a single
    /// `write_all` call so a write is either the whole line or nothing.
    pub fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AuditError::Io {
                path: parent.to_string_lossy().to_string(),
                source: e,
            })?;
        }

        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AuditError::Io {
                path: self.path.to_string_lossy().to_string(),
                source: e,
            })?;
        file.write_all(&line).map_err(|e| AuditError::Io {
            path: self.path.to_string_lossy().to_string(),
            source: e,
        })?;

        debug!(event_type = %event.event_type, path = %self.path.display(), "audit event appended");
        Ok(())
    }

    /// Convenience constructor + append, timestamped with `now`.
    pub fn log(&self, event_type: impl Into<String>, now: DateTime<Utc>) -> AuditEventBuilder<'_> {
        AuditEventBuilder {
            log: self,
            event: AuditEvent::new(event_type, now),
        }
    }

    /// Reads every line, skipping ones that fail to parse (a corrupt or
    /// truncated trailing line must never make the whole log unreadable).
    fn read_all(&self) -> Vec<AuditEvent> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEvent>(line) {
                Ok(event) => out.push(event),
                Err(e) => warn!(line = i, error = %e, "skipping unparseable audit line"),
            }
        }
        out
    }

    /// Returns the last `n` events, optionally filtered to `event_type`, in
    /// chronological order (oldest of the returned tail first).
    pub fn last_events(&self, n: usize, event_type: Option<&str>) -> Vec<AuditEvent> {
        let mut events = self.read_all();
        if let Some(ty) = event_type {
            events.retain(|e| e.event_type == ty);
        }
        if events.len() > n {
            events.drain(0..events.len() - n);
        }
        events
    }

    /// Returns every event with `timestamp >= since`, in file order.
    pub fn query(&self, since: DateTime<Utc>) -> Vec<AuditEvent> {
        self.read_all()
            .into_iter()
            .filter(|e| e.timestamp >= since)
            .collect()
    }
}

/// Fluent builder returned by [`AuditLog::log`], so call sites read close to
/// the original's `audit.log("gate_compress", confidence=.., cost=..)`.
pub struct AuditEventBuilder<'a> {
    log: &'a AuditLog,
    event: AuditEvent,
}

impl<'a> AuditEventBuilder<'a> {
    pub fn cost(mut self, cost: f64) -> Self {
        self.event = self.event.with_cost(cost);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.event = self.event.with_model(model);
        self
    }

    pub fn tokens(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.event = self.event.with_tokens(input_tokens, output_tokens);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.event = self.event.with_meta(key, value);
        self
    }

    pub fn write(self) -> Result<(), AuditError> {
        self.log.append(&self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn append_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));

        log.log("gate_compress", ts(100)).cost(0.001).write().unwrap();
        log.log("gate_synthesis", ts(200))
            .model("flash")
            .meta("confidence", 85)
            .write()
            .unwrap();

        let all = log.last_events(10, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].event_type, "gate_synthesis");
        assert_eq!(all[1].model.as_deref(), Some("flash"));
    }

    #[test]
    fn last_events_filters_by_type_and_caps_count() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));

        for i in 0..5 {
            log.log("gate_attempt", ts(i)).write().unwrap();
        }
        log.log("gate_escalate", ts(100)).write().unwrap();

        let attempts = log.last_events(2, Some("gate_attempt"));
        assert_eq!(attempts.len(), 2);
        assert!(attempts.iter().all(|e| e.event_type == "gate_attempt"));

        let escalates = log.last_events(20, Some("gate_escalate"));
        assert_eq!(escalates.len(), 1);
    }

    #[test]
    fn query_returns_events_since_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));

        log.log("a", ts(10)).write().unwrap();
        log.log("b", ts(20)).write().unwrap();
        log.log("c", ts(30)).write().unwrap();

        let recent = log.query(ts(20));
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event_type, "b");
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("nonexistent.jsonl"));
        assert!(log.last_events(10, None).is_empty());
        assert!(log.query(ts(0)).is_empty());
    }

    #[test]
    fn corrupt_trailing_line_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::new(path.clone());
        log.log("a", ts(1)).write().unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"not valid json\n").unwrap();

        let events = log.last_events(10, None);
        assert_eq!(events.len(), 1);
    }
}
