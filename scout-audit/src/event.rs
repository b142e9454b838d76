//! One line of the audit log (§3 `AuditEvent`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single append-only audit record.
///
/// `metadata` absorbs whatever extra attribution a caller wants to carry
/// (`confidence`, `reason`, `task_type`, ...) without the event schema
/// growing a field per call site — mirrors how the original's
/// `AuditLog.log(event_type, **fields)` accepted arbitrary keyword fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

impl AuditEvent {
    pub fn new(event_type: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            event_type: event_type.into(),
            cost: None,
            model: None,
            input_tokens: None,
            output_tokens: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tokens(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self
    }

    /// Attaches one free-form metadata field (e.g. `confidence`, `reason`).
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Reads a metadata field back out, for callers/tests asserting on a
    /// single attribution field (e.g. `event.meta("reason")`).
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}
