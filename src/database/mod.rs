/// Database module for PostgreSQL integration
///
/// This module provides:
/// - r2d2 connection pooling for PostgreSQL
/// - Repository pattern implementations of the Store contract
/// - Database models and schema
/// - An in-memory store with the same contract for tests and demo mode

pub mod connection;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod schema;

pub use connection::{establish_connection_pool, DatabaseError, DatabasePool};
pub use memory::InMemoryStore;
