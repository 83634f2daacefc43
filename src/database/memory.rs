use crate::database::connection::DatabaseError;
use crate::database::models::{Instrument, NewInstrument, NewPriceCandle, PriceCandle};
use crate::database::repositories::{CandleRepository, InstrumentRepository};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// In-memory Store implementing both repository traits
///
/// Backs the daemon when no DATABASE_URL is configured (demo mode, nothing
/// survives a restart) and serves as the Store double in tests. Mirrors the
/// PostgreSQL semantics the jobs rely on: case-insensitive symbol
/// uniqueness, strictly-older-than purge, and the instrument-delete candle
/// cascade.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    instruments: Vec<Instrument>,
    candles: Vec<PriceCandle>,
    next_instrument_id: i64,
    next_candle_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl InstrumentRepository for InMemoryStore {
    async fn get_all(&self) -> Result<Vec<Instrument>, DatabaseError> {
        let inner = self.inner.read();
        let mut all = inner.instruments.clone();
        all.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(all)
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Instrument>, DatabaseError> {
        let wanted = symbol.trim();
        let inner = self.inner.read();
        Ok(inner
            .instruments
            .iter()
            .find(|i| i.symbol.eq_ignore_ascii_case(wanted))
            .cloned())
    }

    async fn exists_by_symbol(&self, symbol: &str) -> Result<bool, DatabaseError> {
        Ok(self.find_by_symbol(symbol).await?.is_some())
    }

    async fn insert(&self, new_instrument: NewInstrument) -> Result<Instrument, DatabaseError> {
        let mut inner = self.inner.write();

        if inner
            .instruments
            .iter()
            .any(|i| i.symbol.eq_ignore_ascii_case(&new_instrument.symbol))
        {
            return Err(DatabaseError::QueryError(format!(
                "duplicate key value violates unique constraint: symbol {}",
                new_instrument.symbol
            )));
        }

        inner.next_instrument_id += 1;
        let instrument = Instrument {
            id: inner.next_instrument_id,
            symbol: new_instrument.symbol,
            name: new_instrument.name,
            exchange: new_instrument.exchange,
            created_at: new_instrument.created_at,
            updated_at: new_instrument.updated_at,
        };
        inner.instruments.push(instrument.clone());
        Ok(instrument)
    }

    async fn delete(&self, instrument_id: i64) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write();
        let before = inner.instruments.len();
        inner.instruments.retain(|i| i.id != instrument_id);
        let removed = inner.instruments.len() < before;
        if removed {
            inner.candles.retain(|c| c.instrument_id != instrument_id);
        }
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl CandleRepository for InMemoryStore {
    async fn insert(&self, new_candle: NewPriceCandle) -> Result<PriceCandle, DatabaseError> {
        let mut inner = self.inner.write();
        inner.next_candle_id += 1;
        let candle = PriceCandle {
            id: inner.next_candle_id,
            instrument_id: new_candle.instrument_id,
            timestamp: new_candle.timestamp,
            open_price: new_candle.open_price,
            high_price: new_candle.high_price,
            low_price: new_candle.low_price,
            close_price: new_candle.close_price,
            volume: new_candle.volume,
            timeframe: new_candle.timeframe,
            created_at: new_candle.created_at,
        };
        inner.candles.push(candle.clone());
        Ok(candle)
    }

    async fn get_latest(&self, instrument_id: i64) -> Result<Option<PriceCandle>, DatabaseError> {
        let inner = self.inner.read();
        Ok(inner
            .candles
            .iter()
            .filter(|c| c.instrument_id == instrument_id)
            .max_by_key(|c| (c.timestamp, c.id))
            .cloned())
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let mut inner = self.inner.write();
        let before = inner.candles.len();
        inner.candles.retain(|c| c.timestamp >= cutoff);
        Ok(before - inner.candles.len())
    }

    async fn count_by_instrument(&self, instrument_id: i64) -> Result<i64, DatabaseError> {
        let inner = self.inner.read();
        Ok(inner
            .candles
            .iter()
            .filter(|c| c.instrument_id == instrument_id)
            .count() as i64)
    }

    async fn distinct_timeframes(&self, instrument_id: i64) -> Result<Vec<String>, DatabaseError> {
        let inner = self.inner.read();
        let mut timeframes: Vec<String> = Vec::new();
        for candle in inner.candles.iter().filter(|c| c.instrument_id == instrument_id) {
            if !timeframes.contains(&candle.timeframe) {
                timeframes.push(candle.timeframe.clone());
            }
        }
        Ok(timeframes)
    }
}
