//! Running cost of token consumption against a hard budget ceiling.

use tracing::warn;

/// USD per million tokens, input and output priced separately.
#[derive(Debug, Clone, Copy)]
pub struct Pricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Default for Pricing {
    /// Gemini Flash pricing.
    fn default() -> Self {
        Self {
            input_per_million: 0.075,
            output_per_million: 0.30,
        }
    }
}

/// Accumulates priced token usage and latches once the budget is reached.
///
/// Totals only ever grow, and `is_exhausted` never flips back to false
/// within a run: the caller stops issuing calls but may still record the
/// one already in flight.
#[derive(Debug)]
pub struct CostTracker {
    pricing: Pricing,
    budget_usd: f64,
    input_tokens: u64,
    output_tokens: u64,
    cost_usd: f64,
    exhausted: bool,
}

impl CostTracker {
    pub fn new(budget_usd: f64, pricing: Pricing) -> Self {
        Self {
            pricing,
            budget_usd,
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            exhausted: false,
        }
    }

    /// Record one call's usage. Returns the cost of that call in USD.
    pub fn record(&mut self, input_tokens: u64, output_tokens: u64) -> f64 {
        let call_cost = input_tokens as f64 / 1_000_000.0 * self.pricing.input_per_million
            + output_tokens as f64 / 1_000_000.0 * self.pricing.output_per_million;

        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.cost_usd += call_cost;

        if !self.exhausted && self.cost_usd >= self.budget_usd {
            self.exhausted = true;
            warn!(
                cost_usd = self.cost_usd,
                budget_usd = self.budget_usd,
                "budget ceiling reached"
            );
        }
        call_cost
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn cost_usd(&self) -> f64 {
        self.cost_usd
    }

    pub fn budget_usd(&self) -> f64 {
        self.budget_usd
    }

    pub fn input_tokens(&self) -> u64 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> u64 {
        self.output_tokens
    }
}
