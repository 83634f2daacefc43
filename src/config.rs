use chrono::Weekday;
use std::str::FromStr;

/// Top-level daemon configuration, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection URL; when unset the daemon runs on the
    /// in-memory store
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections
    pub db_pool_size: u32,

    pub jobs: JobsConfig,
    pub generator: GeneratorConfig,
}

/// Cadences and horizon for the three background jobs
#[derive(Debug, Clone)]
pub struct JobsConfig {
    /// Seconds between price-update firings
    pub price_update_interval_secs: u64,

    /// Hour of day (UTC) the retention job fires
    pub retention_hour: u32,

    /// Minute of the retention hour
    pub retention_minute: u32,

    /// Candles older than this many days are purged
    pub retention_horizon_days: i64,

    /// Day of week the trend-analysis job fires
    pub trend_weekday: Weekday,

    /// Hour of day (UTC) the trend-analysis job fires
    pub trend_hour: u32,

    /// Minute of the trend hour
    pub trend_minute: u32,
}

/// Numeric ranges for the synthetic candle generator
///
/// The defaults are the demonstration constants the generated history is
/// calibrated against; override them via the environment if needed, but the
/// generator makes no attempt to sanity-check exotic combinations.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Timeframe label stamped on every generated candle
    pub timeframe: String,

    /// Seed price range [min, max) used when an instrument has no history
    pub seed_price_min: f64,
    pub seed_price_max: f64,

    /// Maximum per-tick price change as a fraction of the base price
    pub max_step_fraction: f64,

    /// Maximum pad added above/below the body for the high/low wicks
    pub wick_pad_max: f64,

    /// Volume range [min, max)
    pub volume_min: i64,
    pub volume_max: i64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            price_update_interval_secs: 300,
            retention_hour: 2,
            retention_minute: 0,
            retention_horizon_days: 30,
            trend_weekday: Weekday::Sun,
            trend_hour: 1,
            trend_minute: 0,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            timeframe: "5m".to_string(),
            seed_price_min: 50.0,
            seed_price_max: 500.0,
            max_step_fraction: 0.05,
            wick_pad_max: 5.0,
            volume_min: 1_000_000,
            volume_max: 10_000_000,
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables, falling back to
    /// the defaults above for anything unset or unparseable
    pub fn from_env() -> Self {
        let jobs = JobsConfig {
            price_update_interval_secs: env_parse(
                "PRICE_UPDATE_INTERVAL_SECS",
                JobsConfig::default().price_update_interval_secs,
            ),
            retention_hour: env_parse("RETENTION_HOUR", JobsConfig::default().retention_hour),
            retention_minute: env_parse("RETENTION_MINUTE", JobsConfig::default().retention_minute),
            retention_horizon_days: env_parse(
                "RETENTION_HORIZON_DAYS",
                JobsConfig::default().retention_horizon_days,
            ),
            trend_weekday: env_parse("TREND_WEEKDAY", JobsConfig::default().trend_weekday),
            trend_hour: env_parse("TREND_HOUR", JobsConfig::default().trend_hour),
            trend_minute: env_parse("TREND_MINUTE", JobsConfig::default().trend_minute),
        };

        let generator_defaults = GeneratorConfig::default();
        let generator = GeneratorConfig {
            timeframe: std::env::var("CANDLE_TIMEFRAME")
                .unwrap_or(generator_defaults.timeframe),
            seed_price_min: env_parse("SEED_PRICE_MIN", generator_defaults.seed_price_min),
            seed_price_max: env_parse("SEED_PRICE_MAX", generator_defaults.seed_price_max),
            max_step_fraction: env_parse("MAX_STEP_FRACTION", generator_defaults.max_step_fraction),
            wick_pad_max: env_parse("WICK_PAD_MAX", generator_defaults.wick_pad_max),
            volume_min: env_parse("VOLUME_MIN", generator_defaults.volume_min),
            volume_max: env_parse("VOLUME_MAX", generator_defaults.volume_max),
        };

        Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            db_pool_size: env_parse("DB_POOL_MAX_SIZE", 10),
            jobs,
            generator,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_defaults_match_demo_constants() {
        let jobs = JobsConfig::default();
        assert_eq!(jobs.price_update_interval_secs, 300);
        assert_eq!(jobs.retention_hour, 2);
        assert_eq!(jobs.retention_horizon_days, 30);
        assert_eq!(jobs.trend_weekday, Weekday::Sun);
        assert_eq!(jobs.trend_hour, 1);
    }

    #[test]
    fn test_generator_defaults_match_demo_constants() {
        let generator = GeneratorConfig::default();
        assert_eq!(generator.timeframe, "5m");
        assert_eq!(generator.seed_price_min, 50.0);
        assert_eq!(generator.seed_price_max, 500.0);
        assert_eq!(generator.max_step_fraction, 0.05);
        assert_eq!(generator.wick_pad_max, 5.0);
        assert_eq!(generator.volume_min, 1_000_000);
        assert_eq!(generator.volume_max, 10_000_000);
    }
}
