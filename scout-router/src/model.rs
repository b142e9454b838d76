//! Result type returned by the router (§4.5).

use scout_gate::GateDecision;

/// A completed gated synthesis call: the final model's answer plus the
/// gate decision that routed it, so callers can attribute cost/confidence
/// across both stages.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub content: String,
    pub cost_usd: f64,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub decision: GateDecision,
}
