//! Batch classification engine.
//!
//! Walks the debate set in deterministic order and, for each debate: scores
//! the speech sample against the lexicon, skips straight to a negative
//! outcome when nothing matched, otherwise paces, asks the LLM, meters the
//! token cost, combines both signals, and persists the outcome. The run
//! halts early once the cost tracker reports budget exhaustion; the
//! in-flight debate is always persisted first.
//!
//! Processing is strictly sequential on one task; the pacer and tracker are
//! owned here exclusively, which is what upholds the spacing and
//! monotonic-cost guarantees without locks.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use oratio_core::{Lexicon, Outcome, combine};
use oratio_llm::{CostTracker, LlmClient, RequestPacer, Transport};
use oratio_store::{DebateFilter, DebateStore, StoreError};

/// Speeches sampled per debate for scoring and the LLM excerpt.
pub const DEFAULT_SPEECH_SAMPLE: usize = 5;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The store answered but held no debates for the filter. Reported, not
    /// retried.
    #[error("no debates matched the filter")]
    NoDebates,

    /// Store failures are fatal; outcomes already written stay valid.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// All debates were visited.
    Completed,
    /// The budget ceiling stopped the run early.
    BudgetAborted,
}

/// Terminal accounting for one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    pub total_debates: usize,
    pub processed: usize,
    pub skipped: usize,
    pub llm_analyzed: usize,
    pub related: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub budget_usd: f64,
}

impl RunReport {
    /// Debates left unvisited by a budget abort.
    pub fn remaining(&self) -> usize {
        self.total_debates - self.processed
    }
}

/// One classification run over a debate store.
pub struct Engine<'a, T> {
    store: &'a DebateStore,
    client: LlmClient<T>,
    lexicon: Lexicon,
    tracker: CostTracker,
    pacer: RequestPacer,
    speech_sample: usize,
}

impl<'a, T: Transport> Engine<'a, T> {
    pub fn new(
        store: &'a DebateStore,
        client: LlmClient<T>,
        lexicon: Lexicon,
        tracker: CostTracker,
        min_interval: Duration,
    ) -> Self {
        Self {
            store,
            client,
            lexicon,
            tracker,
            pacer: RequestPacer::new(min_interval),
            speech_sample: DEFAULT_SPEECH_SAMPLE,
        }
    }

    pub fn with_speech_sample(mut self, speech_sample: usize) -> Self {
        self.speech_sample = speech_sample;
        self
    }

    /// Run the classification over every debate the filter admits.
    pub async fn run(mut self, filter: &DebateFilter) -> Result<RunReport, EngineError> {
        self.store.ensure_classification_columns()?;

        let debates = self.store.debates(filter)?;
        if debates.is_empty() {
            return Err(EngineError::NoDebates);
        }
        let total_debates = debates.len();
        info!(
            total_debates,
            budget_usd = self.tracker.budget_usd(),
            "starting classification run"
        );

        let mut processed = 0usize;
        let mut skipped = 0usize;
        let mut llm_analyzed = 0usize;
        let mut related = 0usize;
        let mut aborted = false;

        for (index, debate) in debates.iter().enumerate() {
            info!(
                n = index + 1,
                total_debates,
                date = %debate.date,
                title = %debate.title,
                "processing debate"
            );

            let sample = self.store.speech_sample(&debate.debate_id, self.speech_sample)?;
            let text = sample.join("\n\n");
            let score = self.lexicon.score(&text);

            if !score.any_match() {
                info!("no keyword matches, skipping LLM");
                self.store
                    .persist_outcome(&Outcome::skipped(debate.debate_id.as_str()))?;
                processed += 1;
                skipped += 1;
                continue;
            }

            info!(
                keywords = score.matched.len(),
                keyword_confidence = score.confidence,
                "keywords matched"
            );

            self.pacer.wait().await;
            let verdict = self.client.classify(debate, &score.matched, &text).await;
            let call_cost = self.tracker.record(verdict.input_tokens, verdict.output_tokens);
            llm_analyzed += 1;

            let decision = combine(
                score.confidence,
                score.matched.len(),
                verdict.related,
                verdict.confidence,
            );
            info!(
                related = decision.related,
                confidence = decision.confidence,
                llm_confidence = verdict.confidence,
                call_cost_usd = call_cost,
                total_cost_usd = self.tracker.cost_usd(),
                "debate classified"
            );
            if decision.related {
                related += 1;
            }

            self.store.persist_outcome(&Outcome {
                debate_id: debate.debate_id.clone(),
                related: decision.related,
                confidence: decision.confidence,
                keyword_confidence: score.confidence,
                llm_confidence: verdict.confidence,
                matched_keywords: score.matched,
                reasoning: verdict.reasoning,
            })?;
            processed += 1;

            // Checked only at the debate boundary: the debate that crossed
            // the ceiling is billed and kept.
            if self.tracker.is_exhausted() {
                warn!(
                    processed,
                    total_debates, "budget exhausted, halting after current debate"
                );
                aborted = true;
                break;
            }
        }

        let report = RunReport {
            status: if aborted {
                RunStatus::BudgetAborted
            } else {
                RunStatus::Completed
            },
            total_debates,
            processed,
            skipped,
            llm_analyzed,
            related,
            input_tokens: self.tracker.input_tokens(),
            output_tokens: self.tracker.output_tokens(),
            cost_usd: self.tracker.cost_usd(),
            budget_usd: self.tracker.budget_usd(),
        };
        info!(
            status = ?report.status,
            processed = report.processed,
            skipped = report.skipped,
            llm_analyzed = report.llm_analyzed,
            related = report.related,
            cost_usd = report.cost_usd,
            "run finished"
        );
        Ok(report)
    }
}
