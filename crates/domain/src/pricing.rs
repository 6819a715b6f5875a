//! Authoritative pricing: effective unit prices and order totals.
//!
//! Discount configuration is fetched once per request by the caller and
//! passed in explicitly; nothing in this module reads ambient state.

use common::Money;
use serde::{Deserialize, Serialize};

use crate::product::{Product, Variation};

/// How the customer pays. Online payments earn the configured discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cash,
    /// Prepaid through the payment gateway.
    Online,
}

/// Per-request discount configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountConfig {
    /// Percentage knocked off the payable base for non-cash payments.
    pub online_payment_discount_pct: f64,
    /// Minimum paid subtotal before a free-gift line is allowed.
    pub free_gift_threshold: Money,
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            online_payment_discount_pct: 0.0,
            free_gift_threshold: Money::zero(),
        }
    }
}

/// Resolves the effective unit price for a line.
///
/// Variation discount price wins if positive, then the product discount
/// price, then the plain variation or product price.
pub fn effective_unit_price(product: &Product, variation: Option<&Variation>) -> Money {
    if let Some(v) = variation {
        if let Some(dp) = v.disc_price
            && dp.is_positive()
        {
            return dp;
        }
        if let Some(dp) = product.disc_price
            && dp.is_positive()
        {
            return dp;
        }
        return v.price;
    }
    if let Some(dp) = product.disc_price
        && dp.is_positive()
    {
        return dp;
    }
    product.price
}

/// Aggregate money fields of an order, all derived from the same inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub platform_fee: Money,
    pub delivery_fee: Money,
    pub coupon_discount: Money,
    pub online_discount: Money,
    pub grand_total: Money,
}

/// Computes order totals from a settled subtotal.
///
/// The online discount applies to `subtotal + fees − coupon` and only for
/// non-cash payment methods.
pub fn compute_totals(
    subtotal: Money,
    platform_fee: Money,
    delivery_fee: Money,
    coupon_discount: Money,
    payment_method: PaymentMethod,
    online_discount_pct: f64,
) -> OrderTotals {
    let base = subtotal + platform_fee + delivery_fee - coupon_discount;
    let online_discount = match payment_method {
        PaymentMethod::Cash => Money::zero(),
        PaymentMethod::Online => base.percent(online_discount_pct),
    };
    OrderTotals {
        subtotal,
        platform_fee,
        delivery_fee,
        coupon_discount,
        online_discount,
        grand_total: base - online_discount,
    }
}
