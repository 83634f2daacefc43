/// Background jobs and their scheduling
///
/// Contains the three periodic tasks that own all state evolution:
/// - Price update: append a synthetic candle per instrument
/// - Retention: purge candles past the retention horizon
/// - Trend analysis: per-instrument history summaries
///
/// Per-item failures are values, not exceptions: each job folds them into a
/// `BatchOutcome` so one bad instrument never takes down the batch.

pub mod price_update_job;
pub mod retention_job;
pub mod scheduler;
pub mod trend_analysis_job;

pub use price_update_job::{CandleGenerator, PriceUpdateJob};
pub use retention_job::RetentionJob;
pub use scheduler::{Cadence, FireOutcome, JobHandle, ScheduledJob, Scheduler};
pub use trend_analysis_job::{TrendAnalysisJob, TrendSummary};

use std::fmt;

/// One instrument's failure inside a batch run
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub symbol: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(symbol: &str, reason: impl fmt::Display) -> Self {
        Self {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Aggregated result of one job invocation
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Items processed successfully (for retention: rows removed)
    pub succeeded: usize,

    /// Items that failed, with the instrument symbol and cause
    pub failures: Vec<ItemFailure>,
}

impl BatchOutcome {
    /// Outcome carrying only a success count (no per-item breakdown)
    pub fn from_count(succeeded: usize) -> Self {
        Self {
            succeeded,
            failures: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, symbol: &str, reason: impl fmt::Display) {
        self.failures.push(ItemFailure::new(symbol, reason));
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_outcome_aggregation() {
        let mut outcome = BatchOutcome::default();
        outcome.record_success();
        outcome.record_success();
        outcome.record_failure("TSLA", "store unreachable");

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed(), 1);
        assert_eq!(outcome.failures[0].symbol, "TSLA");
        assert_eq!(outcome.failures[0].reason, "store unreachable");
    }
}
