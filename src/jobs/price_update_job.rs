use crate::config::GeneratorConfig;
use crate::database::connection::DatabaseError;
use crate::database::models::{Instrument, NewInstrument, NewPriceCandle, PriceCandle};
use crate::database::repositories::{CandleRepository, InstrumentRepository};
use crate::jobs::scheduler::ScheduledJob;
use crate::jobs::BatchOutcome;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

/// Fixed demonstration set seeded when the store holds no instruments
pub const SAMPLE_INSTRUMENTS: [(&str, &str, &str); 8] = [
    ("AAPL", "Apple Inc.", "NASDAQ"),
    ("GOOGL", "Alphabet Inc.", "NASDAQ"),
    ("MSFT", "Microsoft Corporation", "NASDAQ"),
    ("AMZN", "Amazon.com Inc.", "NASDAQ"),
    ("TSLA", "Tesla Inc.", "NASDAQ"),
    ("NVDA", "NVIDIA Corporation", "NASDAQ"),
    ("META", "Meta Platforms Inc.", "NASDAQ"),
    ("NFLX", "Netflix Inc.", "NASDAQ"),
];

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generated value {0} is not representable as a decimal")]
    UnrepresentableValue(f64),
}

/// Synthetic OHLCV generator - a stand-in for a real market-data feed
///
/// Walks each instrument's price from its previous close. The randomness
/// source is injected so a seeded rng makes generation fully reproducible.
pub struct CandleGenerator {
    config: GeneratorConfig,
    rng: Mutex<StdRng>,
}

impl CandleGenerator {
    pub fn new(config: GeneratorConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn from_os_entropy(config: GeneratorConfig) -> Self {
        Self::new(config, StdRng::from_os_rng())
    }

    /// Produce the next candle for an instrument
    ///
    /// The base price is the previous close when history exists, otherwise a
    /// random seed price. The close moves up to the configured step fraction
    /// in either direction; high/low pad the body outward so
    /// `high >= max(open, close)` and `low <= min(open, close)` always hold.
    pub fn next_candle(
        &self,
        instrument: &Instrument,
        previous: Option<&PriceCandle>,
    ) -> Result<NewPriceCandle, GeneratorError> {
        let mut rng = self.rng.lock();

        let base = match previous {
            Some(candle) => candle.close_price,
            None => to_price(
                rng.random_range(self.config.seed_price_min..self.config.seed_price_max),
            )?,
        };

        let change =
            rng.random_range(-self.config.max_step_fraction..self.config.max_step_fraction);
        let delta = (base * to_decimal(change)?).round_dp(2);

        let open = base;
        let close = base + delta;
        let high = open.max(close) + to_price(rng.random_range(0.0..self.config.wick_pad_max))?;
        let low = open.min(close) - to_price(rng.random_range(0.0..self.config.wick_pad_max))?;
        let volume = rng.random_range(self.config.volume_min..self.config.volume_max);

        Ok(NewPriceCandle::new(
            instrument.id,
            Utc::now(),
            open,
            high,
            low,
            close,
            volume,
            self.config.timeframe.clone(),
        ))
    }
}

fn to_decimal(value: f64) -> Result<Decimal, GeneratorError> {
    Decimal::from_f64_retain(value).ok_or(GeneratorError::UnrepresentableValue(value))
}

fn to_price(value: f64) -> Result<Decimal, GeneratorError> {
    to_decimal(value).map(|d| d.round_dp(2))
}

/// Price update job
///
/// Appends one synthetic candle per instrument per firing. Seeds the
/// demonstration instrument set on an empty store before the first pass.
pub struct PriceUpdateJob {
    instruments: Arc<dyn InstrumentRepository>,
    candles: Arc<dyn CandleRepository>,
    generator: CandleGenerator,
}

impl PriceUpdateJob {
    pub fn new(
        instruments: Arc<dyn InstrumentRepository>,
        candles: Arc<dyn CandleRepository>,
        generator: CandleGenerator,
    ) -> Self {
        Self {
            instruments,
            candles,
            generator,
        }
    }

    /// Insert any demonstration instruments that are not already present
    async fn seed_instruments(&self) -> Result<usize, DatabaseError> {
        let mut created = 0;
        for (symbol, name, exchange) in SAMPLE_INSTRUMENTS {
            if !self.instruments.exists_by_symbol(symbol).await? {
                self.instruments
                    .insert(NewInstrument::new(symbol, name, Some(exchange)))
                    .await?;
                tracing::info!(symbol, name, "created sample instrument");
                created += 1;
            }
        }
        Ok(created)
    }

    /// Run one price-update pass over every instrument
    ///
    /// A failure on one instrument is recorded and the pass continues; no
    /// other instrument's history is touched by the failure.
    pub async fn update_prices(&self) -> Result<BatchOutcome, DatabaseError> {
        let mut instruments = self.instruments.get_all().await?;

        if instruments.is_empty() {
            tracing::info!("no instruments found, seeding demonstration set");
            let created = self.seed_instruments().await?;
            tracing::info!(created, "seeded sample instruments");
            instruments = self.instruments.get_all().await?;
        }

        let mut outcome = BatchOutcome::default();
        for instrument in &instruments {
            match self.generate_for(instrument).await {
                Ok(candle) => {
                    tracing::debug!(
                        symbol = %instrument.symbol,
                        open = %candle.open_price,
                        high = %candle.high_price,
                        low = %candle.low_price,
                        close = %candle.close_price,
                        volume = candle.volume,
                        "generated price candle"
                    );
                    outcome.record_success();
                }
                Err(e) => {
                    tracing::error!(symbol = %instrument.symbol, error = %e, "failed to generate price candle");
                    outcome.record_failure(&instrument.symbol, e);
                }
            }
        }

        Ok(outcome)
    }

    async fn generate_for(
        &self,
        instrument: &Instrument,
    ) -> Result<PriceCandle, Box<dyn std::error::Error + Send + Sync>> {
        let previous = self.candles.get_latest(instrument.id).await?;
        let candle = self.generator.next_candle(instrument, previous.as_ref())?;
        Ok(self.candles.insert(candle).await?)
    }
}

#[async_trait::async_trait]
impl ScheduledJob for PriceUpdateJob {
    fn name(&self) -> &'static str {
        "price_update"
    }

    async fn run(&self) -> Result<BatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.update_prices().await?)
    }
}
