use crate::database::connection::DatabaseError;
use crate::database::models::Instrument;
use crate::database::repositories::{CandleRepository, InstrumentRepository};
use crate::jobs::scheduler::ScheduledJob;
use crate::jobs::{BatchOutcome, ItemFailure};
use serde::Serialize;
use std::sync::Arc;

/// One instrument's aggregated history
#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    pub symbol: String,
    pub name: String,
    pub candle_count: i64,
    pub timeframes: Vec<String>,
}

/// Trend analysis job
///
/// Read-only aggregation over each instrument's candle history. Summaries
/// are reported busiest-instrument-first; nothing in the store is mutated.
pub struct TrendAnalysisJob {
    instruments: Arc<dyn InstrumentRepository>,
    candles: Arc<dyn CandleRepository>,
}

impl TrendAnalysisJob {
    pub fn new(
        instruments: Arc<dyn InstrumentRepository>,
        candles: Arc<dyn CandleRepository>,
    ) -> Self {
        Self {
            instruments,
            candles,
        }
    }

    /// Summarize every instrument, ranked by descending candle count
    ///
    /// A failure on one instrument is collected and the rest continue.
    pub async fn analyze(&self) -> Result<(Vec<TrendSummary>, Vec<ItemFailure>), DatabaseError> {
        let instruments = self.instruments.get_all().await?;

        let mut summaries = Vec::with_capacity(instruments.len());
        let mut failures = Vec::new();

        for instrument in &instruments {
            match self.summarize(instrument).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    tracing::error!(symbol = %instrument.symbol, error = %e, "failed to summarize instrument");
                    failures.push(ItemFailure::new(&instrument.symbol, e));
                }
            }
        }

        summaries.sort_by(|a, b| {
            b.candle_count
                .cmp(&a.candle_count)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        Ok((summaries, failures))
    }

    async fn summarize(&self, instrument: &Instrument) -> Result<TrendSummary, DatabaseError> {
        let candle_count = self.candles.count_by_instrument(instrument.id).await?;
        let mut timeframes = self.candles.distinct_timeframes(instrument.id).await?;
        timeframes.sort();

        Ok(TrendSummary {
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            candle_count,
            timeframes,
        })
    }
}

#[async_trait::async_trait]
impl ScheduledJob for TrendAnalysisJob {
    fn name(&self) -> &'static str {
        "trend_analysis"
    }

    async fn run(&self) -> Result<BatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let (summaries, failures) = self.analyze().await?;

        for summary in &summaries {
            tracing::info!(
                symbol = %summary.symbol,
                name = %summary.name,
                candle_count = summary.candle_count,
                timeframes = ?summary.timeframes,
                "trend summary"
            );
        }

        Ok(BatchOutcome {
            succeeded: summaries.len(),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::InMemoryStore;
    use crate::database::models::{NewInstrument, NewPriceCandle};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    async fn add_candles(store: &InMemoryStore, instrument_id: i64, timeframes: &[&str]) {
        let now = Utc::now();
        for (i, timeframe) in timeframes.iter().enumerate() {
            CandleRepository::insert(
                store,
                NewPriceCandle::new(
                    instrument_id,
                    now - Duration::minutes(timeframes.len() as i64 - i as i64),
                    dec!(100.00),
                    dec!(102.00),
                    dec!(98.00),
                    dec!(101.00),
                    3_000_000,
                    timeframe.to_string(),
                ),
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_summary_counts_and_distinct_timeframes() {
        let store = Arc::new(InMemoryStore::new());
        let instrument = InstrumentRepository::insert(
            store.as_ref(),
            NewInstrument::new("AAPL", "Apple Inc.", None),
        )
        .await
        .unwrap();
        add_candles(&store, instrument.id, &["5m", "5m", "1h"]).await;

        let job = TrendAnalysisJob::new(store.clone(), store.clone());
        let (summaries, failures) = job.analyze().await.unwrap();

        assert!(failures.is_empty());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].symbol, "AAPL");
        assert_eq!(summaries[0].candle_count, 3);
        assert_eq!(summaries[0].timeframes, vec!["1h", "5m"]);
    }

    #[tokio::test]
    async fn test_summaries_are_ranked_by_candle_count() {
        let store = Arc::new(InMemoryStore::new());
        let quiet = InstrumentRepository::insert(
            store.as_ref(),
            NewInstrument::new("AAPL", "Apple Inc.", None),
        )
        .await
        .unwrap();
        let busy = InstrumentRepository::insert(
            store.as_ref(),
            NewInstrument::new("TSLA", "Tesla Inc.", None),
        )
        .await
        .unwrap();

        add_candles(&store, quiet.id, &["5m"]).await;
        add_candles(&store, busy.id, &["5m", "5m", "5m"]).await;

        let job = TrendAnalysisJob::new(store.clone(), store.clone());
        let (summaries, _) = job.analyze().await.unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].symbol, "TSLA");
        assert_eq!(summaries[0].candle_count, 3);
        assert_eq!(summaries[1].symbol, "AAPL");
        assert_eq!(summaries[1].candle_count, 1);
    }

    #[tokio::test]
    async fn test_analysis_does_not_mutate_the_store() {
        let store = Arc::new(InMemoryStore::new());
        let instrument = InstrumentRepository::insert(
            store.as_ref(),
            NewInstrument::new("NFLX", "Netflix Inc.", None),
        )
        .await
        .unwrap();
        add_candles(&store, instrument.id, &["5m", "1h"]).await;

        let job = TrendAnalysisJob::new(store.clone(), store.clone());
        job.analyze().await.unwrap();
        job.analyze().await.unwrap();

        assert_eq!(store.count_by_instrument(instrument.id).await.unwrap(), 2);
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
