//! Checkout engine for the marketplace.
//!
//! Ties the store's atomic stock primitives, the pricing rules and the
//! payment gateway together into the customer-facing order flows: place,
//! pay, cancel, return.

mod coordinator;
mod engine;
mod error;
mod gateway;
mod notify;
mod request;
mod reservation;

pub use engine::{CheckoutEngine, OrderReceipt, PaymentInit};
pub use error::{CheckoutError, Result};
pub use gateway::{GatewaySession, InMemoryGateway, PaymentGateway};
pub use notify::{InMemoryDispatcher, Notification, NotificationDispatcher};
pub use request::{CancelOrder, CartLine, PlaceOrderRequest, ReturnOrReplaceRequest};
pub use reservation::ReservedLine;
