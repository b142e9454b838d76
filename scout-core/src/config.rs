//! Process-level configuration (§2 ambient stack, §6 env vars).
//!
//! `GEMINI_API_KEY`/`GROQ_API_KEY` are validated at construction by
//! [`scout_llm::LlmServiceProfiles::from_env`] — there is no silent
//! default for a secret. `SCOUT_WHIMSY`/`SCOUT_NO_COLOR`/`SCOUT_HIDE_COST`
//! are cosmetic only: nothing in the core reads [`DisplayPrefs`], it
//! exists purely so the binary's output formatting stays strictly
//! downstream of audit events (§9 open question).

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Cosmetic display preferences. Never consulted by any core operation —
/// only by the binary's terminal rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayPrefs {
    pub whimsy: bool,
    pub no_color: bool,
    pub hide_cost: bool,
}

impl DisplayPrefs {
    pub fn from_env() -> Self {
        Self {
            whimsy: env_flag("SCOUT_WHIMSY"),
            no_color: env_flag("SCOUT_NO_COLOR"),
            hide_cost: env_flag("SCOUT_HIDE_COST"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flags_default_to_false() {
        // SAFETY: test-only env mutation, single-threaded test execution.
        unsafe {
            std::env::remove_var("SCOUT_WHIMSY");
        }
        assert!(!DisplayPrefs::from_env().whimsy);
    }
}
