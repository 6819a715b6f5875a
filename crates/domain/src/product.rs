//! Products, variations and the shared variation-resolution rule.

use common::{Money, ProductId, SellerId, VariationId};
use serde::{Deserialize, Serialize};

/// A purchasable configuration of a product with its own stock and price.
///
/// Historically variations were addressed either by id or by any of three
/// label keys (`value`, `title`, `pack`); all three are kept and matched
/// interchangeably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub id: VariationId,
    pub value: Option<String>,
    pub title: Option<String>,
    pub pack: Option<String>,
    pub stock: u32,
    pub price: Money,
    pub disc_price: Option<Money>,
}

impl Variation {
    /// Returns the first present label key, used for order-item snapshots.
    pub fn label(&self) -> Option<&str> {
        self.value
            .as_deref()
            .or(self.title.as_deref())
            .or(self.pack.as_deref())
    }

    /// Returns true if this variation is addressed by the selector.
    pub fn matches(&self, selector: &VariationSelector) -> bool {
        match selector {
            VariationSelector::ById(id) => self.id == *id,
            VariationSelector::ByLabel(label) => {
                self.value.as_deref() == Some(label)
                    || self.title.as_deref() == Some(label)
                    || self.pack.as_deref() == Some(label)
            }
        }
    }
}

/// How a cart line addresses a variation.
///
/// One resolution rule is shared by reservation, pricing and cancellation so
/// the three flows can never disagree about which variation a line means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationSelector {
    /// Address a variation by its id.
    ById(VariationId),
    /// Address a variation by any of its label keys (value/title/pack).
    ByLabel(String),
}

impl std::fmt::Display for VariationSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariationSelector::ById(id) => write!(f, "{id}"),
            VariationSelector::ByLabel(label) => write!(f, "{label}"),
        }
    }
}

/// A catalog product owned by a seller.
///
/// `stock` is the top-level pool; products with variations additionally track
/// per-variation stock, and both levels move together on reserve and restock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub price: Money,
    pub disc_price: Option<Money>,
    pub stock: u32,
    pub variations: Vec<Variation>,
}

impl Product {
    /// Returns true if the product has any variations.
    pub fn has_variations(&self) -> bool {
        !self.variations.is_empty()
    }
}

/// Resolves the variation a cart line refers to.
///
/// Matching selector wins; with no selector (or no match) the first variation
/// slot is used; a product without variations resolves to `None`.
///
/// The first-slot fallback reproduces legacy behavior and most likely papers
/// over a missing client-side selection. It is kept for compatibility but
/// isolated here so a future change touches exactly one place.
pub fn resolve_variation<'a>(
    product: &'a Product,
    selector: Option<&VariationSelector>,
) -> Option<&'a Variation> {
    if let Some(sel) = selector
        && let Some(found) = product.variations.iter().find(|v| v.matches(sel))
    {
        return Some(found);
    }
    product.variations.first()
}
