//! Stock reservation for a single cart line.
//!
//! Reservation is a cascade over three store primitives, each of which is an
//! atomic conditional decrement:
//!
//! 1. a selector addresses a variation: try that variation; if it matches
//!    one that is short on stock the line fails rather than substituting,
//! 2. no selector, or one matching nothing: try the first slot (legacy
//!    fallback),
//! 3. no variations: try top-level product stock,
//! 4. nothing succeeded: the line fails with `InsufficientStock`.
//!
//! Every successful reservation yields a [`StockClaim`] that can restore the
//! exact stock it took.

use common::{Money, ProductId, SellerId, VariationId};
use domain::{effective_unit_price, Product, Variation, VariationSelector};
use store::{MarketStore, TxId};

use crate::error::{CheckoutError, Result};
use crate::request::CartLine;

/// A cart line after its stock has been reserved and its price settled.
#[derive(Debug, Clone)]
pub struct ReservedLine {
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub product_name: String,
    pub variation: Option<Variation>,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    pub free_gift: bool,
}

/// The stock a reservation took, kept for compensation.
#[derive(Debug, Clone)]
pub(crate) enum StockClaim {
    Variation {
        product_id: ProductId,
        variation_id: VariationId,
        quantity: u32,
    },
    Product {
        product_id: ProductId,
        quantity: u32,
    },
}

impl StockClaim {
    /// Puts the claimed stock back.
    pub(crate) async fn release(&self, store: &dyn MarketStore, tx: Option<TxId>) -> Result<()> {
        match self {
            StockClaim::Variation {
                product_id,
                variation_id,
                quantity,
            } => {
                let restocked = store
                    .restock_variation(
                        tx,
                        *product_id,
                        &VariationSelector::ById(*variation_id),
                        *quantity,
                    )
                    .await?;
                if !restocked {
                    tracing::warn!(%product_id, %variation_id, "variation vanished before restock");
                }
            }
            StockClaim::Product {
                product_id,
                quantity,
            } => {
                store.restock_product(tx, *product_id, *quantity).await?;
            }
        }
        Ok(())
    }
}

/// Reserves stock for one line and settles its unit price.
pub(crate) async fn reserve_line(
    store: &dyn MarketStore,
    tx: Option<TxId>,
    line: &CartLine,
    product: &Product,
) -> Result<(ReservedLine, StockClaim)> {
    let (variation, claim) = reserve_stock(store, tx, line, product).await?;

    let unit_price = if line.free_gift {
        Money::zero()
    } else {
        effective_unit_price(product, variation.as_ref())
    };

    Ok((
        ReservedLine {
            product_id: product.id,
            seller_id: product.seller_id,
            product_name: product.name.clone(),
            variation,
            quantity: line.quantity,
            unit_price,
            line_total: unit_price.multiply(line.quantity),
            free_gift: line.free_gift,
        },
        claim,
    ))
}

async fn reserve_stock(
    store: &dyn MarketStore,
    tx: Option<TxId>,
    line: &CartLine,
    product: &Product,
) -> Result<(Option<Variation>, StockClaim)> {
    if let Some(selector) = &line.variant {
        if let Some(variation) = store
            .reserve_variation_stock(tx, product.id, selector, line.quantity)
            .await?
        {
            let claim = StockClaim::Variation {
                product_id: product.id,
                variation_id: variation.id,
                quantity: line.quantity,
            };
            return Ok((Some(variation), claim));
        }
        // The selector addresses a real variation that is just short on
        // stock; substituting another variation here would reserve and
        // charge something the customer never picked.
        if product.variations.iter().any(|v| v.matches(selector)) {
            return Err(insufficient(line, product));
        }
    }

    if product.has_variations() {
        // No selector, or one that matches nothing.
        let Some(variation) = store
            .reserve_fallback_variation_stock(tx, product.id, line.quantity)
            .await?
        else {
            return Err(insufficient(line, product));
        };
        let claim = StockClaim::Variation {
            product_id: product.id,
            variation_id: variation.id,
            quantity: line.quantity,
        };
        return Ok((Some(variation), claim));
    }

    if store
        .reserve_product_stock(tx, product.id, line.quantity)
        .await?
    {
        let claim = StockClaim::Product {
            product_id: product.id,
            quantity: line.quantity,
        };
        return Ok((None, claim));
    }

    Err(insufficient(line, product))
}

fn insufficient(line: &CartLine, product: &Product) -> CheckoutError {
    CheckoutError::InsufficientStock {
        product: product.name.clone(),
        variation: line.variant.as_ref().map(|s| s.to_string()),
    }
}
