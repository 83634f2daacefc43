use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{Instrument, NewInstrument};
use crate::database::schema::{instruments, price_candles};
use diesel::prelude::*;
use std::sync::Arc;

/// Instrument repository trait - defines interface for instrument operations
///
/// Symbols are a case-insensitive identity: lookups normalize their input
/// the same way `NewInstrument` normalizes on insertion.
#[async_trait::async_trait]
pub trait InstrumentRepository: Send + Sync {
    /// Get all instruments
    async fn get_all(&self) -> Result<Vec<Instrument>, DatabaseError>;

    /// Find instrument by symbol (case insensitive)
    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Instrument>, DatabaseError>;

    /// Check if an instrument exists by symbol (case insensitive)
    async fn exists_by_symbol(&self, symbol: &str) -> Result<bool, DatabaseError>;

    /// Insert a new instrument
    async fn insert(&self, new_instrument: NewInstrument) -> Result<Instrument, DatabaseError>;

    /// Delete an instrument and all of its candles
    ///
    /// The candle cascade is part of the contract: callers never have to
    /// clean up orphaned history themselves.
    async fn delete(&self, instrument_id: i64) -> Result<bool, DatabaseError>;
}

/// Concrete implementation of InstrumentRepository backed by PostgreSQL
pub struct InstrumentRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl InstrumentRepositoryImpl {
    /// Create new instrument repository with connection provider
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
impl InstrumentRepository for InstrumentRepositoryImpl {
    async fn get_all(&self) -> Result<Vec<Instrument>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        instruments::table
            .order(instruments::symbol.asc())
            .load::<Instrument>(&mut conn)
            .map_err(DatabaseError::from)
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Instrument>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        instruments::table
            .filter(instruments::symbol.eq(symbol.trim().to_uppercase()))
            .first::<Instrument>(&mut conn)
            .optional()
            .map_err(DatabaseError::from)
    }

    async fn exists_by_symbol(&self, symbol: &str) -> Result<bool, DatabaseError> {
        Ok(self.find_by_symbol(symbol).await?.is_some())
    }

    async fn insert(&self, new_instrument: NewInstrument) -> Result<Instrument, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        diesel::insert_into(instruments::table)
            .values(&new_instrument)
            .get_result::<Instrument>(&mut conn)
            .map_err(DatabaseError::from)
    }

    async fn delete(&self, instrument_id: i64) -> Result<bool, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        conn.transaction::<_, DatabaseError, _>(|conn| {
            diesel::delete(
                price_candles::table.filter(price_candles::instrument_id.eq(instrument_id)),
            )
            .execute(conn)?;

            let deleted = diesel::delete(instruments::table)
                .filter(instruments::id.eq(instrument_id))
                .execute(conn)?;

            Ok(deleted > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    // Repository behavior is covered through the shared trait tests against
    // the in-memory store; this implementation needs a live database.
    #[test]
    #[ignore]
    fn test_instrument_repository_against_database() {
        // Requires DATABASE_URL pointing at a migrated PostgreSQL instance
    }
}
