use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV price candle entity
///
/// One time-bucketed price observation for an instrument. Candles are
/// append-only: written once by the price-update job and removed only by
/// the retention job (or when their instrument is deleted).
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::price_candles)]
pub struct PriceCandle {
    /// Auto-incrementing ID
    pub id: i64,

    /// Instrument ID (foreign key to instruments table)
    pub instrument_id: i64,

    /// Observation timestamp
    pub timestamp: DateTime<Utc>,

    /// Opening price
    pub open_price: Decimal,

    /// Highest price in the bucket
    pub high_price: Decimal,

    /// Lowest price in the bucket
    pub low_price: Decimal,

    /// Closing price
    pub close_price: Decimal,

    /// Volume traded in the bucket (non-negative)
    pub volume: i64,

    /// Bucket granularity label (e.g., "5m", "1h")
    pub timeframe: String,

    /// When this record was created
    pub created_at: DateTime<Utc>,
}

/// New price candle for insertion
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::price_candles)]
pub struct NewPriceCandle {
    pub instrument_id: i64,
    pub timestamp: DateTime<Utc>,
    pub open_price: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
    pub close_price: Decimal,
    pub volume: i64,
    pub timeframe: String,
    pub created_at: DateTime<Utc>,
}

impl NewPriceCandle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instrument_id: i64,
        timestamp: DateTime<Utc>,
        open_price: Decimal,
        high_price: Decimal,
        low_price: Decimal,
        close_price: Decimal,
        volume: i64,
        timeframe: String,
    ) -> Self {
        Self {
            instrument_id,
            timestamp,
            open_price,
            high_price,
            low_price,
            close_price,
            volume,
            timeframe,
            created_at: Utc::now(),
        }
    }
}

impl PriceCandle {
    /// Calculate candle body size (abs(close - open))
    pub fn body_size(&self) -> Decimal {
        (self.close_price - self.open_price).abs()
    }

    /// Calculate candle range (high - low)
    pub fn range(&self) -> Decimal {
        self.high_price - self.low_price
    }

    /// Check if candle is bullish (close > open)
    pub fn is_bullish(&self) -> bool {
        self.close_price > self.open_price
    }

    /// Check if candle is bearish (close < open)
    pub fn is_bearish(&self) -> bool {
        self.close_price < self.open_price
    }
}
