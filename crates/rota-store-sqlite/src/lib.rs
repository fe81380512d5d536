//! SQLite backend for the Rota duty engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write path of the engine runs
//! inside one `BEGIN IMMEDIATE` transaction on that thread.

mod encode;
mod engine;
mod queries;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
