//! Persistence layer for the marketplace engine.
//!
//! The [`MarketStore`] trait is the only way the rest of the system touches
//! data. Stock mutations are exposed as atomic conditional updates (never
//! read-then-write), and multi-document transactions are an optional
//! capability probed per request: [`StoreError::TransactionUnsupported`]
//! routes callers onto the best-effort path.
//!
//! Two backends are provided: [`InMemoryStore`] for tests and single-node
//! deployments, and [`PostgresStore`] backed by sqlx.

mod error;
mod memory;
mod postgres;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{MarketStore, TxId};
