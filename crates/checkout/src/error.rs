//! Checkout error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the checkout flows.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A request failed a validation rule. The message is user-facing.
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A stock reservation could not be satisfied.
    #[error("insufficient stock for '{product}'")]
    InsufficientStock {
        product: String,
        variation: Option<String>,
    },

    /// The delivery address is outside a seller's service area, or a seller
    /// cannot be service-checked at all.
    #[error("{0}")]
    ServiceArea(DomainError),

    /// A live return or replacement request already claims the item.
    #[error("a return or replacement request already exists for this item")]
    DuplicateRequest,

    /// The payment gateway rejected or failed an operation.
    #[error("payment gateway error: {0}")]
    Gateway(String),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => CheckoutError::Validation(msg),
            other => CheckoutError::ServiceArea(other),
        }
    }
}

/// Convenience alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
