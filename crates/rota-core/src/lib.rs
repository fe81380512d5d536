//! Core types and decision logic for the Rota duty-rotation engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Period resolution, holder selection, and yearly round-robin planning are
//! pure functions here; storage backends implement [`store::DutyStore`] and
//! call into them from inside their transactions.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assignment;
pub mod directory;
pub mod error;
pub mod period;
pub mod planning;
pub mod pool;
pub mod report;
pub mod selection;
pub mod store;

pub use error::{Error, Result};

/// Identifier of a user, owned by the surrounding application.
pub type UserId = i64;

/// Identifier of a sector, owned by the surrounding application.
pub type SectorId = i64;
