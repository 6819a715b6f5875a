//! Store error types.

use crate::store::TxId;
use thiserror::Error;

/// Errors that can occur in the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend does not support multi-document transactions.
    ///
    /// This is a capability signal, not a failure: callers fall back to
    /// best-effort sequential writes.
    #[error("store does not support transactions")]
    TransactionUnsupported,

    /// A transaction id was used after commit/rollback, or never existed.
    #[error("unknown or closed transaction {0}")]
    UnknownTransaction(TxId),

    /// A record that should exist was missing mid-operation.
    #[error("{kind} {id} not found")]
    MissingRecord { kind: &'static str, id: String },

    /// Database error from the sqlx backend.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted value could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
