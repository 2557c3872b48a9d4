//! Minimum spacing between consecutive LLM calls.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

/// Blocks the caller until at least the configured interval has passed
/// since the previous call.
///
/// This guarantees minimum spacing only, not a rolling-window cap,
/// which is enough because the engine issues calls strictly sequentially
/// from a single task.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Wait out the remainder of the interval, then stamp the call time.
    /// The first call never waits.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                debug!(wait_ms = remaining.as_millis() as u64, "pacing LLM call");
                sleep(remaining).await;
            }
        }
        self.last_call = Some(Instant::now());
    }
}
