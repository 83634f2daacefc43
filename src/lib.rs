// Library Crate Root
// lib.rs

// lib.rs is the public API contract for the crate; main.rs imports through
// it like an external crate would
pub mod config;
pub mod database;
pub mod jobs;

// pub use = re-export at crate root
pub use config::{AppConfig, GeneratorConfig, JobsConfig};
pub use database::models::{Instrument, NewInstrument, NewPriceCandle, PriceCandle};
pub use database::{DatabaseError, InMemoryStore};
pub use jobs::{
    BatchOutcome, Cadence, CandleGenerator, PriceUpdateJob, RetentionJob, Scheduler,
    TrendAnalysisJob, TrendSummary,
};
