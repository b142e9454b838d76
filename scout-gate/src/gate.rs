//! The middle-manager gate (§4.4): a bounded retry loop that asks a cheap
//! model to compress facts into a grounded brief, falling back to
//! escalation (raw context, no compression) when confidence or grounding
//! never clears the bar within the attempt budget.

use std::future::Future;

use chrono::Utc;
use scout_audit::AuditLog;
use scout_facts::ModuleFacts;
use scout_llm::LlmCallResult;
use tracing::{info, warn};

use crate::error::GateError;
use crate::grounding::verify_grounding;
use crate::model::{Decision, GateDecision};
use crate::reply::parse_gate_reply;

const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;
const DEFAULT_MAX_ATTEMPTS: u32 = 2;
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Everything the gate needs to compress one question into a brief.
/// Grouped into a struct rather than positional args per §4.4's contract
/// (`question`, `facts`, `raw_tldr_context`, `query_symbols` are all
/// optional except `question`).
pub struct GateInput<'a> {
    pub question: &'a str,
    pub facts: Option<&'a ModuleFacts>,
    pub raw_tldr_context: Option<&'a str>,
    pub query_symbols: Option<&'a [String]>,
}

impl<'a> GateInput<'a> {
    pub fn new(question: &'a str) -> Self {
        Self {
            question,
            facts: None,
            raw_tldr_context: None,
            query_symbols: None,
        }
    }

    pub fn with_facts(mut self, facts: &'a ModuleFacts) -> Self {
        self.facts = Some(facts);
        self
    }

    pub fn with_raw_tldr_context(mut self, context: &'a str) -> Self {
        self.raw_tldr_context = Some(context);
        self
    }

    pub fn with_query_symbols(mut self, symbols: &'a [String]) -> Self {
        self.query_symbols = Some(symbols);
        self
    }

    fn raw_context_fallback(&self) -> String {
        if let Some(facts) = self.facts {
            summarize_facts(facts)
        } else {
            self.raw_tldr_context.unwrap_or_default().to_string()
        }
    }
}

fn summarize_facts(facts: &ModuleFacts) -> String {
    let mut lines = Vec::new();
    if let Some(doc) = &facts.module_docstring {
        lines.push(doc.clone());
    }
    for (name, fact) in &facts.symbols {
        let sig = fact.signature.as_deref().unwrap_or("");
        lines.push(format!("{:?} {name}{sig}", fact.kind));
    }
    lines.join("\n")
}

fn build_prompt(input: &GateInput, context: &str) -> String {
    let symbols = input
        .query_symbols
        .map(|s| s.join(", "))
        .unwrap_or_default();
    format!(
        "Question: {}\nRelevant symbols: {}\n\nSource material:\n{}\n\nRespond with:\nconfidence_score: <0.0-1.0>\n<brief>\n[GAP] <anything ungroundable>",
        input.question, symbols, context
    )
}

/// The confidence-gated compressor (§4.4).
pub struct MiddleManagerGate {
    audit: AuditLog,
    confidence_threshold: f64,
    max_attempts: u32,
    max_tokens: u32,
}

impl MiddleManagerGate {
    pub fn new(audit: AuditLog) -> Self {
        Self {
            audit,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Runs the compress-validate-retry loop. `call_middle_manager` is
    /// injected so tests and `scout-core` can both drive this without a
    /// live network call — mirrors the original's injectable
    /// `middle_manager_client` callable rather than a trait object, in
    /// keeping with this codebase's enum-dispatch-over-dyn convention.
    pub async fn validate_and_compress<F, Fut>(
        &self,
        input: GateInput<'_>,
        call_middle_manager: F,
    ) -> Result<GateDecision, GateError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<LlmCallResult, scout_llm::AiLlmError>>,
    {
        let context = input.raw_context_fallback();
        let prompt = build_prompt(&input, &context);

        let mut attempts = 0u32;
        let mut total_cost = 0.0;
        let mut accumulated_gaps: Vec<String> = Vec::new();

        while attempts < self.max_attempts {
            attempts += 1;
            let call_result = call_middle_manager(prompt.clone()).await;

            let call = match call_result {
                Ok(call) => call,
                Err(err) => {
                    warn!(attempt = attempts, error = %err, "middle-manager call failed");
                    self.audit
                        .log("gate_attempt", Utc::now())
                        .meta("outcome", "llm_transport_error")
                        .meta("attempt", attempts)
                        .write()?;
                    continue;
                }
            };
            total_cost += call.cost_usd;

            let reply = match parse_gate_reply(&call.content) {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(attempt = attempts, error = %err, "unparseable middle-manager reply");
                    self.audit
                        .log("gate_attempt", Utc::now())
                        .cost(call.cost_usd)
                        .meta("outcome", "parse_error")
                        .meta("attempt", attempts)
                        .write()?;
                    continue;
                }
            };

            for gap in &reply.gaps {
                if !accumulated_gaps.contains(gap) {
                    accumulated_gaps.push(gap.clone());
                }
            }

            let grounding = verify_grounding(&reply.brief, input.facts, input.raw_tldr_context);
            let passes = reply.confidence >= self.confidence_threshold && grounding.is_grounded();

            self.audit
                .log("gate_attempt", Utc::now())
                .cost(call.cost_usd)
                .meta("attempt", attempts)
                .meta("confidence", reply.confidence)
                .meta("grounding_score", grounding.score)
                .meta("outcome", if passes { "pass" } else { "retry" })
                .write()?;

            if passes {
                info!(attempt = attempts, confidence = reply.confidence, "gate passed");
                self.audit
                    .log("gate_compress", Utc::now())
                    .cost(total_cost)
                    .meta("confidence", reply.confidence)
                    .meta("attempts", attempts)
                    .write()?;
                return Ok(GateDecision {
                    decision: Decision::Pass,
                    content: reply.brief,
                    confidence: reply.confidence,
                    gaps: reply.gaps,
                    attempts,
                    cost_usd: total_cost,
                });
            }
        }

        info!(attempts, "gate exhausted attempts, escalating");
        self.audit
            .log("gate_escalate", Utc::now())
            .cost(total_cost)
            .meta("attempts", attempts)
            .meta("reason", "confidence_or_grounding_below_threshold")
            .write()?;

        Ok(GateDecision {
            decision: Decision::Escalate,
            content: context,
            confidence: 0.0,
            gaps: accumulated_gaps,
            attempts,
            cost_usd: total_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_facts::{SymbolFact, SymbolKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn facts_with(name: &str) -> ModuleFacts {
        ModuleFacts {
            path: "a.py".to_string(),
            symbols: vec![(
                name.to_string(),
                SymbolFact::new(SymbolKind::Function, name, 1),
            )],
            control_flow: Vec::new(),
            imports: Default::default(),
            module_docstring: None,
            checksum: String::new(),
        }
    }

    fn llm_result(content: &str) -> LlmCallResult {
        LlmCallResult {
            content: content.to_string(),
            cost_usd: 0.0001,
            model: "llama-3.3-70b-versatile".to_string(),
            input_tokens: 10,
            output_tokens: 10,
        }
    }

    #[tokio::test]
    async fn high_confidence_grounded_reply_passes() {
        let dir = tempfile::tempdir().unwrap();
        let gate = MiddleManagerGate::new(AuditLog::new(dir.path().join("audit.jsonl")));
        let facts = facts_with("validate_and_compress");

        let input = GateInput::new("what does this do?").with_facts(&facts);
        let decision = gate
            .validate_and_compress(input, |_prompt| async {
                Ok(llm_result(
                    "confidence_score: 0.9\nvalidate_and_compress compresses facts into a brief.",
                ))
            })
            .await
            .unwrap();

        assert!(decision.is_pass());
        assert_eq!(decision.attempts, 1);
        assert!(decision.content.contains("validate_and_compress"));
    }

    #[tokio::test]
    async fn low_confidence_exhausts_attempts_and_escalates_with_raw_content() {
        let dir = tempfile::tempdir().unwrap();
        let gate = MiddleManagerGate::new(AuditLog::new(dir.path().join("audit.jsonl")))
            .with_max_attempts(2);
        let facts = facts_with("validate_and_compress");

        let input = GateInput::new("what does this do?").with_facts(&facts);
        let decision = gate
            .validate_and_compress(input, |_prompt| async {
                Ok(llm_result("confidence_score: 0.2\nnot confident"))
            })
            .await
            .unwrap();

        assert!(!decision.is_pass());
        assert_eq!(decision.attempts, 2);
        assert!(decision.content.contains("validate_and_compress"));
    }

    #[tokio::test]
    async fn escalate_accumulates_gaps_from_every_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let gate = MiddleManagerGate::new(AuditLog::new(dir.path().join("audit.jsonl")))
            .with_max_attempts(2);
        let facts = facts_with("validate_and_compress");
        let calls = AtomicU32::new(0);

        let input = GateInput::new("what does this do?").with_facts(&facts);
        let decision = gate
            .validate_and_compress(input, |_prompt| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(llm_result(
                            "confidence_score: 0.5\nnot confident\n[GAP] retry budget unspecified",
                        ))
                    } else {
                        Ok(llm_result(
                            "confidence_score: 0.5\nstill not confident\n[GAP] threshold default unclear",
                        ))
                    }
                }
            })
            .await
            .unwrap();

        assert!(!decision.is_pass());
        assert_eq!(decision.attempts, 2);
        assert_eq!(
            decision.gaps,
            vec![
                "retry budget unspecified".to_string(),
                "threshold default unclear".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn ungrounded_reply_retries_then_escalates() {
        let dir = tempfile::tempdir().unwrap();
        let gate = MiddleManagerGate::new(AuditLog::new(dir.path().join("audit.jsonl")))
            .with_max_attempts(1);
        let facts = facts_with("validate_and_compress");

        let input = GateInput::new("what does this do?").with_facts(&facts);
        let decision = gate
            .validate_and_compress(input, |_prompt| async {
                Ok(llm_result(
                    "confidence_score: 0.95\nThe nonexistent_fabricated_symbol handles it all.",
                ))
            })
            .await
            .unwrap();

        assert!(!decision.is_pass());
    }

    #[tokio::test]
    async fn transport_failure_is_a_failed_attempt_not_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let gate = MiddleManagerGate::new(AuditLog::new(dir.path().join("audit.jsonl")))
            .with_max_attempts(2);
        let calls = AtomicU32::new(0);

        let input = GateInput::new("what does this do?");
        let decision = gate
            .validate_and_compress(input, |_prompt| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(scout_llm::AiLlmError::Malformed {
                            provider: scout_llm::error_handler::Provider::Groq,
                            detail: "boom".to_string(),
                        })
                    } else {
                        Ok(llm_result("confidence_score: 0.9\ngrounded brief"))
                    }
                }
            })
            .await
            .unwrap();

        assert!(decision.is_pass());
        assert_eq!(decision.attempts, 2);
    }

    #[tokio::test]
    async fn parse_failure_retries_within_budget() {
        let dir = tempfile::tempdir().unwrap();
        let gate = MiddleManagerGate::new(AuditLog::new(dir.path().join("audit.jsonl")))
            .with_max_attempts(2);
        let calls = AtomicU32::new(0);

        let input = GateInput::new("what does this do?");
        let decision = gate
            .validate_and_compress(input, |_prompt| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(llm_result("garbage, no confidence line"))
                    } else {
                        Ok(llm_result("confidence_score: 0.9\ngrounded brief"))
                    }
                }
            })
            .await
            .unwrap();

        assert!(decision.is_pass());
        assert_eq!(decision.attempts, 2);
    }
}
