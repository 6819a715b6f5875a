//! Typed UUID identifiers.
//!
//! Each record kind gets its own wrapper so a `ProductId` can never be
//! passed where an `OrderId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a customer.
    CustomerId
);
define_id!(
    /// Unique identifier for a product.
    ProductId
);
define_id!(
    /// Unique identifier for a product variation.
    VariationId
);
define_id!(
    /// Unique identifier for a seller.
    SellerId
);
define_id!(
    /// Unique identifier for an order.
    OrderId
);
define_id!(
    /// Unique identifier for a single order line item.
    OrderItemId
);
define_id!(
    /// Unique identifier for a return/replacement request.
    ReturnId
);
