//! The big-brain router (§4.5): gates a question through the
//! middle-manager, then synthesizes with Flash (gate pass) or Pro (gate
//! escalate). A Pro transport failure falls back to Flash once — never
//! the reverse, since a pass decision already judged Flash sufficient.

use std::sync::Arc;

use chrono::Utc;
use scout_audit::AuditLog;
use scout_facts::ModuleFacts;
use scout_gate::{GateInput, MiddleManagerGate};
use scout_llm::LlmServiceProfiles;
use tracing::warn;

use crate::error::RouterError;
use crate::model::SynthesisResult;

const SYNTHESIS_SYSTEM_PROMPT: &str = "You answer concisely based on the provided context.";
const SYNTHESIS_MAX_TOKENS: u32 = 1024;

pub struct BigBrainRouter {
    profiles: Arc<LlmServiceProfiles>,
    gate: MiddleManagerGate,
    audit: AuditLog,
}

impl BigBrainRouter {
    pub fn new(profiles: Arc<LlmServiceProfiles>, gate: MiddleManagerGate, audit: AuditLog) -> Self {
        Self {
            profiles,
            gate,
            audit,
        }
    }

    fn build_synthesis_prompt(question: &str, context: &str, gaps: &[String]) -> String {
        let gap_context = if gaps.is_empty() {
            String::new()
        } else {
            let lines: Vec<String> = gaps.iter().map(|g| format!("- {g}")).collect();
            format!("\n\n[GAP MARKERS FROM GATE]\n{}", lines.join("\n"))
        };
        format!(
            "Context:\n{context}\n{gap_context}\n\n---\nQuestion: {question}\n\nAnswer based on the context above. If gaps exist above, acknowledge uncertainty where relevant."
        )
    }

    /// Runs the full gate-then-synthesize pipeline for one question.
    pub async fn call_gated(
        &self,
        question: &str,
        facts: Option<&ModuleFacts>,
        raw_tldr_context: Option<&str>,
        query_symbols: Option<&[String]>,
    ) -> Result<SynthesisResult, RouterError> {
        let mut input = GateInput::new(question);
        if let Some(facts) = facts {
            input = input.with_facts(facts);
        }
        if let Some(context) = raw_tldr_context {
            input = input.with_raw_tldr_context(context);
        }
        if let Some(symbols) = query_symbols {
            input = input.with_query_symbols(symbols);
        }

        let profiles = Arc::clone(&self.profiles);
        let decision = self
            .gate
            .validate_and_compress(input, |prompt| {
                let profiles = Arc::clone(&profiles);
                async move { profiles.call_middle_manager(&prompt, None, None).await }
            })
            .await?;

        let prompt = Self::build_synthesis_prompt(question, &decision.content, &decision.gaps);

        let (primary_call, used_pro) = if decision.is_pass() {
            self.audit
                .log("gate_synthesis", Utc::now())
                .model("flash")
                .meta("confidence", (decision.confidence * 100.0).round())
                .write()?;
            (
                self.profiles
                    .call_flash(&prompt, Some(SYNTHESIS_SYSTEM_PROMPT), Some(SYNTHESIS_MAX_TOKENS))
                    .await,
                false,
            )
        } else {
            self.audit
                .log("gate_synthesis", Utc::now())
                .model("pro")
                .meta("reason", "escalate")
                .write()?;
            (
                self.profiles
                    .call_pro(&prompt, Some(SYNTHESIS_SYSTEM_PROMPT), Some(SYNTHESIS_MAX_TOKENS))
                    .await,
                true,
            )
        };

        let call = match primary_call {
            Ok(call) => call,
            Err(err) if used_pro && err.is_transport() => {
                warn!(error = %err, "pro synthesis transport failure, falling back to flash");
                self.profiles
                    .call_flash(&prompt, Some(SYNTHESIS_SYSTEM_PROMPT), Some(SYNTHESIS_MAX_TOKENS))
                    .await?
            }
            Err(err) => return Err(err.into()),
        };

        Ok(SynthesisResult {
            content: call.content,
            cost_usd: call.cost_usd + decision.cost_usd,
            model: call.model,
            input_tokens: call.input_tokens,
            output_tokens: call.output_tokens,
            decision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_prompt_includes_gap_markers() {
        let prompt = BigBrainRouter::build_synthesis_prompt(
            "what does this do?",
            "some context",
            &["retry budget unspecified".to_string()],
        );
        assert!(prompt.contains("[GAP MARKERS FROM GATE]"));
        assert!(prompt.contains("retry budget unspecified"));
        assert!(prompt.contains("what does this do?"));
    }

    #[test]
    fn synthesis_prompt_omits_gap_section_when_empty() {
        let prompt = BigBrainRouter::build_synthesis_prompt("q", "context", &[]);
        assert!(!prompt.contains("[GAP MARKERS FROM GATE]"));
    }
}
