//! Data model for the gate (§3 `GateDecision`, §9 typed `GateReply`).

/// Terminal decision of one `validate_and_compress` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Pass,
    Escalate,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Pass => write!(f, "pass"),
            Decision::Escalate => write!(f, "escalate"),
        }
    }
}

/// Result of the gate (§3). On `Pass`, `content` is the compressed brief;
/// on `Escalate`, `content` is the raw fact bundle passed in — never a
/// degraded compression (invariant viii).
#[derive(Debug, Clone)]
pub struct GateDecision {
    pub decision: Decision,
    pub content: String,
    pub confidence: f64,
    pub gaps: Vec<String>,
    pub attempts: u32,
    pub cost_usd: f64,
}

impl GateDecision {
    pub fn is_pass(&self) -> bool {
        self.decision == Decision::Pass
    }
}

/// Typed parse of the middle-manager's free-form reply (§9 redesign flag:
/// "expose a typed `GateReply` sum type internally; never let raw strings
/// cross into the decision logic").
#[derive(Debug, Clone, PartialEq)]
pub struct GateReply {
    pub confidence: f64,
    pub brief: String,
    pub gaps: Vec<String>,
}
