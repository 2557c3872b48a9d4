//! Shared types passed between the store, the LLM client, and the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One debate enumerated from the `debates` table.
///
/// Immutable once read; the engine never writes back to the debate rows
/// themselves, only to the speech rows belonging to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debate {
    pub debate_id: String,
    pub date: NaiveDate,
    pub title: String,
}

/// The LLM's answer for one debate, including the token usage the call consumed.
///
/// Every failure path of the client resolves to one of these rather than an
/// error: `reasoning` then carries the diagnostic and the confidence is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmVerdict {
    pub related: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl LlmVerdict {
    /// A negative verdict with zero tokens, for terminal call failures.
    pub fn failure(reasoning: impl Into<String>) -> Self {
        Self {
            related: false,
            confidence: 0.0,
            reasoning: reasoning.into(),
            input_tokens: 0,
            output_tokens: 0,
        }
    }
}

/// The final classification written onto every speech row of a debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub debate_id: String,
    pub related: bool,
    pub confidence: f64,
    pub keyword_confidence: f64,
    pub llm_confidence: f64,
    pub matched_keywords: Vec<String>,
    pub reasoning: String,
}

impl Outcome {
    /// Outcome for a debate whose text matched no keywords at all.
    pub fn skipped(debate_id: impl Into<String>) -> Self {
        Self {
            debate_id: debate_id.into(),
            related: false,
            confidence: 0.0,
            keyword_confidence: 0.0,
            llm_confidence: 0.0,
            matched_keywords: Vec::new(),
            reasoning: "No keywords found".to_string(),
        }
    }
}
