/// Represents the backend used for a large language model call.
///
/// Scout talks to two families of provider, matching §4.6 of the design:
/// - `Gemini` serves both the Flash (cheap) and Pro (expensive) synthesis tiers.
/// - `Groq` serves the ~70B middle-manager model used by the compression gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    Gemini,
    Groq,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::Groq => write!(f, "groq"),
        }
    }
}
