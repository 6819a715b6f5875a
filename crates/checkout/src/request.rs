//! Inbound request types for the checkout flows.

use common::{CustomerId, Money, OrderId, OrderItemId, ProductId};
use domain::{DeliveryAddress, PaymentMethod, RequestType, VariationSelector};
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// One cart line in a placement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Optional variation the customer picked.
    #[serde(default)]
    pub variant: Option<VariationSelector>,
    /// Promotional line shipped at zero price.
    #[serde(default)]
    pub free_gift: bool,
}

/// A request to place an order, shared by the cash and online flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: CustomerId,
    pub items: Vec<CartLine>,
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub platform_fee: Money,
    #[serde(default)]
    pub delivery_fee: Money,
    #[serde(default)]
    pub coupon_discount: Money,
}

impl PlaceOrderRequest {
    /// Checks structural rules that need no store access.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(CheckoutError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }
        if self.items.iter().any(|line| line.quantity == 0) {
            return Err(CheckoutError::Validation(
                "item quantity must be at least 1".to_string(),
            ));
        }
        if self.items.iter().all(|line| line.free_gift) {
            return Err(CheckoutError::Validation(
                "order cannot consist of free gifts only".to_string(),
            ));
        }
        self.delivery_address.validate()?;
        Ok(())
    }
}

/// A request to cancel an order while it is still cancellable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub reason: String,
    /// Who asked: a customer id or an operator tag.
    pub cancelled_by: String,
}

impl CancelOrder {
    pub fn validate(&self) -> Result<()> {
        if self.reason.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "cancellation needs a reason".to_string(),
            ));
        }
        Ok(())
    }
}

/// A customer request to return or replace a delivered line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnOrReplaceRequest {
    pub order_id: OrderId,
    pub order_item_id: OrderItemId,
    pub customer_id: CustomerId,
    pub request_type: RequestType,
    pub reason: String,
    pub quantity: u32,
    /// Evidence photos; replacements require at least one.
    #[serde(default)]
    pub images: Vec<String>,
}

impl ReturnOrReplaceRequest {
    pub fn validate(&self) -> Result<()> {
        if self.reason.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "return request needs a reason".to_string(),
            ));
        }
        if self.quantity == 0 {
            return Err(CheckoutError::Validation(
                "return quantity must be at least 1".to_string(),
            ));
        }
        if self.request_type == RequestType::Replacement && self.images.is_empty() {
            return Err(CheckoutError::Validation(
                "replacement requests need at least one image".to_string(),
            ));
        }
        Ok(())
    }
}
