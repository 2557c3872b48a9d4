//! Core types, keyword lexicon, and verdict combination. Pure, no I/O.

pub mod decision;
pub mod lexicon;
pub mod types;

pub use decision::{Verdict, combine};
pub use lexicon::{KeywordScore, Lexicon, LexiconError};
pub use types::{Debate, LlmVerdict, Outcome};
