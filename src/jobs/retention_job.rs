use crate::database::connection::DatabaseError;
use crate::database::repositories::CandleRepository;
use crate::jobs::scheduler::ScheduledJob;
use crate::jobs::BatchOutcome;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Retention job
///
/// Purges candles past the retention horizon. Idempotent: a second run with
/// no new data deletes nothing. Instrument rows are never touched.
pub struct RetentionJob {
    candles: Arc<dyn CandleRepository>,
    horizon: Duration,
}

impl RetentionJob {
    pub fn new(candles: Arc<dyn CandleRepository>, horizon_days: i64) -> Self {
        Self {
            candles,
            horizon: Duration::days(horizon_days),
        }
    }

    /// The purge cutoff for a given wall-clock instant
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.horizon
    }

    /// Delete all candles strictly older than the horizon
    pub async fn purge(&self) -> Result<usize, DatabaseError> {
        let cutoff = self.cutoff(Utc::now());
        let deleted = self.candles.delete_before(cutoff).await?;

        tracing::info!(deleted, %cutoff, "purged price candles older than cutoff");

        Ok(deleted)
    }
}

#[async_trait::async_trait]
impl ScheduledJob for RetentionJob {
    fn name(&self) -> &'static str {
        "retention"
    }

    async fn run(&self) -> Result<BatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let deleted = self.purge().await?;
        Ok(BatchOutcome::from_count(deleted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::InMemoryStore;
    use crate::database::models::{NewInstrument, NewPriceCandle};
    use crate::database::repositories::InstrumentRepository;
    use rust_decimal_macros::dec;

    async fn store_with_candle_ages(
        now: DateTime<Utc>,
        ages_days: &[i64],
    ) -> (Arc<InMemoryStore>, i64) {
        let store = Arc::new(InMemoryStore::new());
        let instrument = InstrumentRepository::insert(
            store.as_ref(),
            NewInstrument::new("AAPL", "Apple Inc.", None),
        )
        .await
        .unwrap();

        for age in ages_days {
            CandleRepository::insert(
                store.as_ref(),
                NewPriceCandle::new(
                    instrument.id,
                    now - Duration::days(*age),
                    dec!(100.00),
                    dec!(101.00),
                    dec!(99.00),
                    dec!(100.50),
                    1_500_000,
                    "5m".to_string(),
                ),
            )
            .await
            .unwrap();
        }

        (store, instrument.id)
    }

    #[tokio::test]
    async fn test_purge_removes_only_candles_past_the_horizon() {
        // Ages measured from one fixed instant: the 30-day-old candle sits
        // exactly on the cutoff and must survive
        let now = Utc::now();
        let (store, instrument_id) = store_with_candle_ages(now, &[10, 29, 30, 31, 45]).await;
        let job = RetentionJob::new(store.clone(), 30);

        let deleted = store.delete_before(job.cutoff(now)).await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(store.count_by_instrument(instrument_id).await.unwrap(), 3);

        // Idempotent: nothing further to remove
        assert_eq!(store.delete_before(job.cutoff(now)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_keeps_instruments_and_recent_candles() {
        let (store, instrument_id) = store_with_candle_ages(Utc::now(), &[1, 45]).await;
        let job = RetentionJob::new(store.clone(), 30);

        assert_eq!(job.purge().await.unwrap(), 1);
        assert_eq!(job.purge().await.unwrap(), 0);

        assert_eq!(store.count_by_instrument(instrument_id).await.unwrap(), 1);
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
