//! Weighted keyword lexicon and local relevance scoring.
//!
//! Two disjoint term lists (primary terms name the subject directly,
//! secondary terms only gesture at it) are matched whole-word and
//! case-insensitively against debate text, then folded into a confidence
//! score. Scoring is deterministic and does no I/O; the expensive LLM stage
//! downstream is only consulted when at least one term matched.

use regex::Regex;
use thiserror::Error;

/// Score contribution per matched primary term.
pub const PRIMARY_WEIGHT: f64 = 0.3;
/// Ceiling on the primary contribution.
pub const PRIMARY_CAP: f64 = 1.0;
/// Score contribution per matched secondary term.
pub const SECONDARY_WEIGHT: f64 = 0.05;
/// Ceiling on the secondary contribution.
pub const SECONDARY_CAP: f64 = 0.3;

// ── Built-in Brexit lexicon ──

const BREXIT_PRIMARY: &[&str] = &[
    "brexit",
    "leave campaign",
    "remain campaign",
    "article 50",
    "referendum",
    "eu referendum",
    "european referendum",
    "leave the eu",
    "leaving the eu",
    "exit from europe",
    "withdrawal agreement",
    "divorce bill",
    "transition period",
    "hard brexit",
    "soft brexit",
    "british exit",
    "eu exit",
    "no-deal brexit",
    "brexit-related",
];

const BREXIT_SECONDARY: &[&str] = &[
    "european union",
    "european community",
    "eu membership",
    "brussels",
    "strasbourg",
    "european commission",
    "european parliament",
    "eurozone",
    "single market",
    "customs union",
    "free movement",
    "schengen",
    "eu law",
    "eu regulation",
    "eu directive",
    "eu budget",
    "eu contribution",
    "sovereignty",
    "independence",
    "british sovereignty",
    "take back control",
    "immigration control",
    "border control",
    "trade agreement",
    "trade deal",
    "wto",
    "northern ireland protocol",
    "backstop",
    "irish border",
    "member state",
    "future relationship",
    "european treaty",
    "maastricht treaty",
    "partnership agreement",
    "economic partnership",
    "freedom of movement",
    "european integration",
];

/// Result of scoring one text against the lexicon.
///
/// `matched` lists distinct matched terms, primary first in list order, then
/// secondary in list order.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordScore {
    pub confidence: f64,
    pub matched: Vec<String>,
}

impl KeywordScore {
    /// Whether any term matched. This, not the confidence, gates the LLM stage.
    pub fn any_match(&self) -> bool {
        !self.matched.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("term pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// A term and its precompiled whole-word pattern.
struct Term {
    text: String,
    pattern: Regex,
}

impl Term {
    fn new(term: &str) -> Result<Self, LexiconError> {
        let text = term.to_lowercase();
        // Matching happens against lowercased text, so the pattern itself
        // needs no case-insensitivity flag.
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&text)))?;
        Ok(Self { text, pattern })
    }
}

/// Two weighted, disjoint term lists with precompiled whole-word patterns.
pub struct Lexicon {
    primary: Vec<Term>,
    secondary: Vec<Term>,
}

impl Lexicon {
    /// Build a lexicon from primary and secondary term lists.
    pub fn new<S: AsRef<str>>(primary: &[S], secondary: &[S]) -> Result<Self, LexiconError> {
        let primary = primary
            .iter()
            .map(|t| Term::new(t.as_ref()))
            .collect::<Result<_, _>>()?;
        let secondary = secondary
            .iter()
            .map(|t| Term::new(t.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { primary, secondary })
    }

    /// The built-in Brexit lexicon.
    pub fn brexit() -> Self {
        Self::new(BREXIT_PRIMARY, BREXIT_SECONDARY).expect("built-in terms compile")
    }

    pub fn primary_count(&self) -> usize {
        self.primary.len()
    }

    pub fn secondary_count(&self) -> usize {
        self.secondary.len()
    }

    /// Score a text: whole-word match every term, weight the match counts.
    pub fn score(&self, text: &str) -> KeywordScore {
        if text.is_empty() {
            return KeywordScore {
                confidence: 0.0,
                matched: Vec::new(),
            };
        }

        let lowered = text.to_lowercase();

        let matched_primary: Vec<&Term> = self
            .primary
            .iter()
            .filter(|t| t.pattern.is_match(&lowered))
            .collect();
        let matched_secondary: Vec<&Term> = self
            .secondary
            .iter()
            .filter(|t| t.pattern.is_match(&lowered))
            .collect();

        let primary_score = (matched_primary.len() as f64 * PRIMARY_WEIGHT).min(PRIMARY_CAP);
        let secondary_score =
            (matched_secondary.len() as f64 * SECONDARY_WEIGHT).min(SECONDARY_CAP);
        let confidence = (primary_score + secondary_score).min(1.0);

        let matched = matched_primary
            .into_iter()
            .chain(matched_secondary)
            .map(|t| t.text.clone())
            .collect();

        KeywordScore { confidence, matched }
    }
}
