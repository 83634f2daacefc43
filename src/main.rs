use std::sync::Arc;
use stock_trend_tracker::config::AppConfig;
use stock_trend_tracker::database::repositories::{
    CandleRepository, CandleRepositoryImpl, InstrumentRepository, InstrumentRepositoryImpl,
};
use stock_trend_tracker::database::{establish_connection_pool, InMemoryStore};
use stock_trend_tracker::jobs::{
    Cadence, CandleGenerator, PriceUpdateJob, RetentionJob, Scheduler, TrendAnalysisJob,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Store = (Arc<dyn InstrumentRepository>, Arc<dyn CandleRepository>);

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_trend_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let (instruments, candles) = initialize_store(&config);

    let generator = CandleGenerator::from_os_entropy(config.generator.clone());
    let price_update = PriceUpdateJob::new(instruments.clone(), candles.clone(), generator);
    let retention = RetentionJob::new(candles.clone(), config.jobs.retention_horizon_days);
    let trend_analysis = TrendAnalysisJob::new(instruments.clone(), candles.clone());

    let mut scheduler = Scheduler::new();
    scheduler.register(
        Arc::new(price_update),
        Cadence::Every(chrono::Duration::seconds(
            config.jobs.price_update_interval_secs as i64,
        )),
    );
    scheduler.register(
        Arc::new(retention),
        Cadence::DailyAt {
            hour: config.jobs.retention_hour,
            minute: config.jobs.retention_minute,
        },
    );
    scheduler.register(
        Arc::new(trend_analysis),
        Cadence::WeeklyAt {
            weekday: config.jobs.trend_weekday,
            hour: config.jobs.trend_hour,
            minute: config.jobs.trend_minute,
        },
    );

    tracing::info!("🚀 Stock trend tracker running (Ctrl-C to stop)");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }

    tracing::info!("Shutting down scheduler");
    scheduler.shutdown();
}

/// Build the Store: PostgreSQL when DATABASE_URL is configured, otherwise
/// the in-memory store (demo mode, nothing survives a restart)
fn initialize_store(config: &AppConfig) -> Store {
    if let Some(url) = &config.database_url {
        match establish_connection_pool(url, config.db_pool_size) {
            Ok(pool) => {
                tracing::info!("✅ Database connection pool established");
                let instrument_pool = pool.clone();
                let candle_pool = pool.clone();
                return (
                    Arc::new(InstrumentRepositoryImpl::new(move || {
                        instrument_pool.get_conn()
                    })),
                    Arc::new(CandleRepositoryImpl::new(move || candle_pool.get_conn())),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "❌ Failed to establish database connection");
                tracing::warn!("⚠️  Falling back to the in-memory store");
            }
        }
    } else {
        tracing::warn!("DATABASE_URL not set, using the in-memory store");
    }

    let store = Arc::new(InMemoryStore::new());
    (store.clone(), store)
}
