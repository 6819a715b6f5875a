//! Orders, line items and their lifecycle states.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, OrderItemId, ProductId, SellerId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::pricing::PaymentMethod;

/// The state of an order in its lifecycle.
///
/// ```text
/// Received/Pending ──► Processed ──► Shipped ──► OutForDelivery ──► Delivered
///        │                 │
///        └─────────────────┴──► Cancelled / Rejected          Delivered ──► Returned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Placed and paid (or COD), waiting for the seller to pick it up.
    Received,
    /// Created but awaiting something, e.g. online payment verification.
    #[default]
    Pending,
    /// Accepted by the seller and being prepared.
    Processed,
    /// Handed to delivery.
    Shipped,
    /// On the last leg to the customer.
    OutForDelivery,
    /// Delivered to the customer (terminal except for returns).
    Delivered,
    /// Cancelled by the customer or an admin (terminal).
    Cancelled,
    /// Rejected by the seller (terminal).
    Rejected,
    /// Returned after delivery (terminal).
    Returned,
}

impl OrderStatus {
    /// Returns true if a cancellation may still be requested.
    ///
    /// Once an order is moving (Shipped onwards) or already terminal it can
    /// no longer be cancelled through the restock path.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Received | OrderStatus::Pending | OrderStatus::Processed
        )
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Returned
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "Received",
            OrderStatus::Pending => "Pending",
            OrderStatus::Processed => "Processed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Returned => "Returned",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state of an order, advanced by the gateway verification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        };
        write!(f, "{s}")
    }
}

/// State of a single line item, mutated independently of the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Shipped => "Shipped",
            ItemStatus::Delivered => "Delivered",
            ItemStatus::Cancelled => "Cancelled",
            ItemStatus::Returned => "Returned",
        };
        write!(f, "{s}")
    }
}

/// Where and to whom the order ships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub landmark: Option<String>,
    pub location: common::GeoPoint,
}

impl DeliveryAddress {
    /// Checks the fields the placement flow depends on.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.city.trim().is_empty() {
            return Err(DomainError::validation("delivery address needs a city"));
        }
        if self.pincode.trim().is_empty() {
            return Err(DomainError::validation("delivery address needs a pincode"));
        }
        if !self.location.is_valid() {
            return Err(DomainError::validation(
                "delivery coordinates are out of range",
            ));
        }
        Ok(())
    }
}

/// Cancellation audit fields recorded when an order is cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
    pub cancelled_by: String,
}

/// A placed order: the aggregate root persisted by the checkout flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub platform_fee: Money,
    pub discount: Money,
    pub total: Money,
    pub items: Vec<OrderItemId>,
    /// Gateway order id, set by the online placement variant.
    pub gateway_order_id: Option<String>,
    /// Gateway payment id, set by payment verification.
    pub payment_id: Option<String>,
    pub cancellation: Option<Cancellation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a zero-totals order shell; totals and item ids are attached
    /// after every line has been reserved and priced.
    pub fn shell(
        customer_id: CustomerId,
        address: DeliveryAddress,
        payment_method: PaymentMethod,
        status: OrderStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            customer_id,
            order_number: generate_order_number(),
            status,
            payment_status: PaymentStatus::Pending,
            payment_method,
            delivery_address: address,
            subtotal: Money::zero(),
            tax: Money::zero(),
            shipping: Money::zero(),
            platform_fee: Money::zero(),
            discount: Money::zero(),
            total: Money::zero(),
            items: Vec::new(),
            gateway_order_id: None,
            payment_id: None,
            cancellation: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single order line with a price snapshot taken at placement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub total: Money,
    /// Label of the variation the reservation resolved, if any.
    pub variation: Option<String>,
    pub status: ItemStatus,
}

/// Generates a human-readable order number: timestamp plus a short random tail.
fn generate_order_number() -> String {
    let tail = uuid::Uuid::new_v4().as_u128() % 10_000;
    format!("ORD-{}-{:04}", Utc::now().format("%y%m%d%H%M%S"), tail)
}
