//! Per-model USD pricing (§4.6).
//!
//! Rates are hardcoded per-million-token (input + output), indexed by model
//! id with an alias table for version-qualified names. An unknown model
//! falls through to the cheapest known rate and logs a warning — cost
//! accounting must never hard-fail a successful call.

use tracing::warn;

/// Per-million-token USD rates for one model.
#[derive(Debug, Clone, Copy)]
pub struct ModelRate {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Minimum billable cost for a non-empty successful call, to keep accounting
/// non-zero (§4.6).
pub const MIN_BILLABLE_COST_USD: f64 = 1e-7;

const RATES: &[(&str, ModelRate)] = &[
    (
        "gemini-1.5-flash",
        ModelRate {
            input_per_million: 0.30,
            output_per_million: 1.25,
        },
    ),
    (
        "gemini-1.5-pro",
        ModelRate {
            input_per_million: 1.25,
            output_per_million: 5.00,
        },
    ),
    (
        "llama-3.3-70b-versatile",
        ModelRate {
            input_per_million: 0.59,
            output_per_million: 0.79,
        },
    ),
];

/// Aliases for version-qualified or dated model names that should map to a
/// base rate above (e.g. `gemini-1.5-flash-002` → `gemini-1.5-flash`).
fn resolve_alias(model: &str) -> &str {
    for (base, _) in RATES {
        if model.starts_with(base) {
            return base;
        }
    }
    model
}

fn cheapest_rate() -> ModelRate {
    RATES
        .iter()
        .map(|(_, r)| *r)
        .min_by(|a, b| {
            (a.input_per_million + a.output_per_million)
                .total_cmp(&(b.input_per_million + b.output_per_million))
        })
        .expect("RATES is non-empty")
}

/// Looks up the rate for `model`, falling back to the cheapest known rate
/// (with a warning) when the model id is not recognized.
pub fn rate_for(model: &str) -> ModelRate {
    let key = resolve_alias(model);
    match RATES.iter().find(|(name, _)| *name == key) {
        Some((_, rate)) => *rate,
        None => {
            warn!(model, "unknown model id; falling back to cheapest rate");
            cheapest_rate()
        }
    }
}

/// Computes the USD cost of a call given input/output token counts.
///
/// Non-empty successful calls are floored at [`MIN_BILLABLE_COST_USD`].
pub fn estimate_cost_usd(model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    let rate = rate_for(model);
    let cost = (input_tokens as f64 / 1_000_000.0) * rate.input_per_million
        + (output_tokens as f64 / 1_000_000.0) * rate.output_per_million;

    if input_tokens + output_tokens > 0 && cost < MIN_BILLABLE_COST_USD {
        MIN_BILLABLE_COST_USD
    } else {
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_uses_its_own_rate() {
        let cost = estimate_cost_usd("gemini-1.5-flash", 1_000_000, 0);
        assert!((cost - 0.30).abs() < 1e-9);
    }

    #[test]
    fn aliased_model_resolves_to_base_rate() {
        let cost = estimate_cost_usd("gemini-1.5-flash-002", 1_000_000, 0);
        assert!((cost - 0.30).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_falls_back_to_cheapest() {
        let cost = estimate_cost_usd("totally-unknown-model", 1_000_000, 0);
        let cheapest = cheapest_rate().input_per_million;
        assert!((cost - cheapest).abs() < 1e-9);
    }

    #[test]
    fn tiny_nonzero_call_is_floored() {
        let cost = estimate_cost_usd("gemini-1.5-flash", 1, 0);
        assert!(cost >= MIN_BILLABLE_COST_USD);
    }

    #[test]
    fn zero_tokens_cost_zero() {
        let cost = estimate_cost_usd("gemini-1.5-flash", 0, 0);
        assert_eq!(cost, 0.0);
    }
}
