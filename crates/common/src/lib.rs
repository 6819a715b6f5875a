//! Shared primitive types for the marketplace order engine.
//!
//! Everything here is deliberately free of business logic: typed UUID
//! identifiers, an integer-cents [`Money`] type, and [`GeoPoint`] with
//! great-circle distance.

mod geo;
mod ids;
mod money;

pub use geo::GeoPoint;
pub use ids::{CustomerId, OrderId, OrderItemId, ProductId, ReturnId, SellerId, VariationId};
pub use money::Money;
