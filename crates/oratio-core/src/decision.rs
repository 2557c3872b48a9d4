//! Fixed-weight combination of the keyword and LLM signals.

/// Weight of the local keyword confidence in the combined score.
pub const KEYWORD_WEIGHT: f64 = 0.3;
/// Weight of the LLM confidence in the combined score.
pub const LLM_WEIGHT: f64 = 0.7;
/// A debate is related only when the combined confidence exceeds this.
pub const RELATED_THRESHOLD: f64 = 0.5;

/// The combined decision for one debate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub related: bool,
    pub confidence: f64,
}

/// Combine the keyword and LLM confidences into a final verdict.
///
/// A debate with zero matched terms never reached the LLM and is negative
/// unconditionally. The threshold is strict: exactly 0.5 is a negative
/// decision. `llm_related` does not enter the arithmetic; the decision is
/// driven by the combined confidence alone.
pub fn combine(
    keyword_confidence: f64,
    matched_count: usize,
    llm_related: bool,
    llm_confidence: f64,
) -> Verdict {
    if matched_count == 0 {
        return Verdict {
            related: false,
            confidence: 0.0,
        };
    }

    let confidence = KEYWORD_WEIGHT * keyword_confidence + LLM_WEIGHT * llm_confidence;
    let related = confidence > RELATED_THRESHOLD;

    if related != llm_related {
        tracing::debug!(
            llm_related,
            related,
            confidence,
            "combined verdict differs from raw LLM verdict"
        );
    }

    Verdict { related, confidence }
}
