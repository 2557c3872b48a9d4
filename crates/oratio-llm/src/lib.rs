//! LLM classification layer: Gemini transport, reply parsing, request
//! pacing, and cost tracking.

mod client;
mod cost;
mod pacer;
mod parse;
mod transport;

pub use client::{DEFAULT_EXCERPT_CAP, DEFAULT_MAX_RETRIES, LlmClient};
pub use cost::{CostTracker, Pricing};
pub use pacer::RequestPacer;
pub use transport::{
    DEFAULT_MODEL, GeminiTransport, RawReply, TokenUsage, Transport, TransportError,
};
