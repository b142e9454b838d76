//! Parses the middle-manager's free-form reply into a typed [`GateReply`]
//! (§9 redesign flag). The expected shape, grounded in the original's
//! mocked middle-manager fixtures, is:
//!
//! ```text
//! confidence_score: 0.85
//! <brief prose, one or more lines>
//! [GAP] <marker>
//! [GAP] <marker 2>
//! ```
//!
//! `[GAP]` lines are optional and may appear anywhere after the confidence
//! line; everything else is folded into `brief`.

use crate::model::GateReply;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyParseError {
    #[error("reply has no confidence_score line")]
    MissingConfidence,
    #[error("confidence_score value {0:?} is not a number in [0, 1]")]
    InvalidConfidence(String),
}

/// Parses raw middle-manager text into a [`GateReply`]. A malformed reply
/// is a retriable parse failure, not a decision — the caller treats it the
/// same as a failed attempt in the gate's retry loop.
pub fn parse_gate_reply(raw: &str) -> Result<GateReply, ReplyParseError> {
    let mut lines = raw.lines();

    let confidence_line = lines
        .next()
        .ok_or(ReplyParseError::MissingConfidence)?
        .trim();
    let value = confidence_line
        .strip_prefix("confidence_score:")
        .map(str::trim)
        .ok_or(ReplyParseError::MissingConfidence)?;
    let confidence: f64 = value
        .parse()
        .map_err(|_| ReplyParseError::InvalidConfidence(value.to_string()))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ReplyParseError::InvalidConfidence(value.to_string()));
    }

    let mut brief_lines = Vec::new();
    let mut gaps = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if let Some(marker) = trimmed.strip_prefix("[GAP]") {
            gaps.push(marker.trim().to_string());
        } else if !trimmed.is_empty() {
            brief_lines.push(line.to_string());
        }
    }

    Ok(GateReply {
        confidence,
        brief: brief_lines.join("\n").trim().to_string(),
        gaps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_confidence_brief_and_gaps() {
        let raw = "confidence_score: 0.85\nThe gate compresses facts into a brief.\n[GAP] retry budget unspecified\n[GAP] threshold default unclear";
        let reply = parse_gate_reply(raw).unwrap();
        assert_eq!(reply.confidence, 0.85);
        assert_eq!(reply.brief, "The gate compresses facts into a brief.");
        assert_eq!(
            reply.gaps,
            vec!["retry budget unspecified", "threshold default unclear"]
        );
    }

    #[test]
    fn parses_reply_with_no_gaps() {
        let raw = "confidence_score: 0.92\nEverything is grounded.";
        let reply = parse_gate_reply(raw).unwrap();
        assert!(reply.gaps.is_empty());
        assert_eq!(reply.brief, "Everything is grounded.");
    }

    #[test]
    fn missing_confidence_line_is_an_error() {
        let err = parse_gate_reply("just some prose").unwrap_err();
        assert_eq!(err, ReplyParseError::MissingConfidence);
    }

    #[test]
    fn non_numeric_confidence_is_an_error() {
        let err = parse_gate_reply("confidence_score: high\nbrief").unwrap_err();
        assert!(matches!(err, ReplyParseError::InvalidConfidence(_)));
    }

    #[test]
    fn out_of_range_confidence_is_an_error() {
        let err = parse_gate_reply("confidence_score: 1.5\nbrief").unwrap_err();
        assert!(matches!(err, ReplyParseError::InvalidConfidence(_)));
    }
}
