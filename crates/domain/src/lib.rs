//! Domain model for the multi-vendor marketplace order engine.
//!
//! This crate holds the persisted record types (products with variations,
//! orders and their line items, sellers, customers, return requests), the
//! shared variation-resolution rule, the pricing calculator and the
//! service-area check. It contains no I/O; persistence lives in the `store`
//! crate and orchestration in `checkout`.

mod error;
mod order;
mod participants;
mod pricing;
mod product;
mod returns;
mod service_area;

pub use error::DomainError;
pub use order::{
    Cancellation, DeliveryAddress, ItemStatus, Order, OrderItem, OrderStatus, PaymentStatus,
};
pub use participants::{Customer, DEFAULT_SERVICE_RADIUS_KM, Seller, SellerStatus};
pub use pricing::{
    DiscountConfig, OrderTotals, PaymentMethod, compute_totals, effective_unit_price,
};
pub use product::{Product, Variation, VariationSelector, resolve_variation};
pub use returns::{RequestType, ReturnRequest, ReturnStatus};
pub use service_area::check_service_area;
