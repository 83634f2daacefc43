/// Repository pattern implementations for the Store contract
///
/// - Traits define the operations the job subsystem is allowed to consume
/// - `*Impl` types query PostgreSQL through a pooled connection provider
/// - The in-memory store in `database::memory` implements the same traits

pub mod candle_repository;
pub mod instrument_repository;

pub use candle_repository::{CandleRepository, CandleRepositoryImpl};
pub use instrument_repository::{InstrumentRepository, InstrumentRepositoryImpl};
