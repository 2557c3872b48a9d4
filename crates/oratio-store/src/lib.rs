//! Storage layer: DuckDB reads of debates/speeches and outcome upserts.

mod duck;
mod error;

pub use duck::{ClassificationSummary, DebateFilter, DebateStore};
pub use error::StoreError;
