//! Domain error types.

use thiserror::Error;

/// Errors raised by pure domain rules.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input failed a validation rule. The message is user-facing.
    #[error("{0}")]
    Validation(String),

    /// A seller involved in the order has no location on record.
    #[error("seller '{store_name}' has no location on record and cannot be service-checked")]
    SellerLocationMissing { store_name: String },

    /// The customer is outside a seller's delivery radius.
    #[error(
        "seller '{store_name}' is {distance_km:.1} km away, outside its {radius_km:.0} km service area"
    )]
    OutOfServiceArea {
        store_name: String,
        distance_km: f64,
        radius_km: f64,
    },
}

impl DomainError {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}
