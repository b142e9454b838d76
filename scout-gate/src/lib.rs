//! Middle-manager gate (§4.4): confidence- and grounding-gated compression
//! of facts into a brief, with escalation to raw context on failure.

pub mod error;
pub mod gate;
pub mod grounding;
pub mod model;
pub mod reply;

pub use error::GateError;
pub use gate::{GateInput, MiddleManagerGate};
pub use model::{Decision, GateDecision, GateReply};
