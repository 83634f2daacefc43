use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{NewPriceCandle, PriceCandle};
use crate::database::schema::price_candles;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;

/// Candle repository trait - defines interface for price candle operations
///
/// Focused on the operations the job subsystem consumes: append, latest
/// lookup, age-based purge, and the aggregation queries behind trend
/// summaries.
#[async_trait::async_trait]
pub trait CandleRepository: Send + Sync {
    /// Insert a single candle
    async fn insert(&self, new_candle: NewPriceCandle) -> Result<PriceCandle, DatabaseError>;

    /// Get the most recent candle for an instrument (by timestamp, descending)
    async fn get_latest(&self, instrument_id: i64) -> Result<Option<PriceCandle>, DatabaseError>;

    /// Delete candles strictly older than the cutoff, returning the count deleted
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DatabaseError>;

    /// Count candles for an instrument
    async fn count_by_instrument(&self, instrument_id: i64) -> Result<i64, DatabaseError>;

    /// Get distinct timeframe labels present for an instrument
    async fn distinct_timeframes(&self, instrument_id: i64) -> Result<Vec<String>, DatabaseError>;
}

/// Concrete implementation of CandleRepository backed by PostgreSQL
pub struct CandleRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl CandleRepositoryImpl {
    /// Create new candle repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

#[async_trait::async_trait]
impl CandleRepository for CandleRepositoryImpl {
    async fn insert(&self, new_candle: NewPriceCandle) -> Result<PriceCandle, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        diesel::insert_into(price_candles::table)
            .values(&new_candle)
            .get_result::<PriceCandle>(&mut conn)
            .map_err(DatabaseError::from)
    }

    async fn get_latest(&self, instrument_id: i64) -> Result<Option<PriceCandle>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        price_candles::table
            .filter(price_candles::instrument_id.eq(instrument_id))
            .order(price_candles::timestamp.desc())
            .first::<PriceCandle>(&mut conn)
            .optional()
            .map_err(DatabaseError::from)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let deleted = diesel::delete(
            price_candles::table.filter(price_candles::timestamp.lt(cutoff)),
        )
        .execute(&mut conn)?;

        tracing::debug!(deleted, %cutoff, "deleted candles before cutoff");

        Ok(deleted)
    }

    async fn count_by_instrument(&self, instrument_id: i64) -> Result<i64, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        price_candles::table
            .filter(price_candles::instrument_id.eq(instrument_id))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(DatabaseError::from)
    }

    async fn distinct_timeframes(&self, instrument_id: i64) -> Result<Vec<String>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        price_candles::table
            .filter(price_candles::instrument_id.eq(instrument_id))
            .select(price_candles::timeframe)
            .distinct()
            .load::<String>(&mut conn)
            .map_err(DatabaseError::from)
    }
}

#[cfg(test)]
mod tests {
    // Covered through the shared trait tests against the in-memory store;
    // this implementation needs a live database.
    #[test]
    #[ignore]
    fn test_candle_repository_against_database() {
        // Requires DATABASE_URL pointing at a migrated PostgreSQL instance
    }
}
