//! The `MarketStore` trait: CRUD plus atomic conditional stock updates.

use async_trait::async_trait;
use common::{CustomerId, OrderId, OrderItemId, ProductId, SellerId};
use domain::{Customer, Order, OrderItem, Product, ReturnRequest, Seller, Variation, VariationSelector};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Handle for an open store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(Uuid);

impl TxId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistence operations used by the checkout engine.
///
/// Every `reserve_*`/`restock_*` method is a single atomic conditional
/// write: two concurrent calls against the same stock unit can never both
/// succeed past the available quantity. Mutating methods take an optional
/// transaction; `None` writes directly.
#[async_trait]
pub trait MarketStore: Send + Sync {
    // -- Transactions --

    /// Opens a multi-document transaction.
    ///
    /// Returns [`crate::StoreError::TransactionUnsupported`] when the backend
    /// cannot provide one; callers then proceed non-transactionally.
    async fn begin_transaction(&self) -> Result<TxId>;

    /// Commits and closes a transaction.
    async fn commit(&self, tx: TxId) -> Result<()>;

    /// Rolls back and closes a transaction.
    async fn rollback(&self, tx: TxId) -> Result<()>;

    // -- Catalog and parties --

    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn insert_seller(&self, seller: &Seller) -> Result<()>;
    async fn get_seller(&self, id: SellerId) -> Result<Option<Seller>>;
    async fn insert_customer(&self, customer: &Customer) -> Result<()>;
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    // -- Stock primitives --

    /// Decrements a matched variation's stock and the product's top-level
    /// stock together, provided the variation matches `selector` and has at
    /// least `qty` in stock. Returns the matched variation on success.
    async fn reserve_variation_stock(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        selector: &VariationSelector,
        qty: u32,
    ) -> Result<Option<Variation>>;

    /// Legacy fallback: decrements the first variation slot (and product
    /// stock) if that slot has at least `qty` in stock.
    async fn reserve_fallback_variation_stock(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        qty: u32,
    ) -> Result<Option<Variation>>;

    /// Decrements top-level product stock if at least `qty` is available.
    /// Returns false when stock was insufficient.
    async fn reserve_product_stock(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        qty: u32,
    ) -> Result<bool>;

    /// Increments a matched variation's stock and the product's top-level
    /// stock together (the restock mirror of [`reserve_variation_stock`]).
    /// Returns false when no variation matched.
    ///
    /// [`reserve_variation_stock`]: MarketStore::reserve_variation_stock
    async fn restock_variation(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        selector: &VariationSelector,
        qty: u32,
    ) -> Result<bool>;

    /// Increments top-level product stock.
    async fn restock_product(&self, tx: Option<TxId>, product_id: ProductId, qty: u32)
    -> Result<()>;

    // -- Orders --

    async fn insert_order(&self, tx: Option<TxId>, order: &Order) -> Result<()>;
    async fn update_order(&self, tx: Option<TxId>, order: &Order) -> Result<()>;
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;
    async fn delete_order(&self, tx: Option<TxId>, id: OrderId) -> Result<()>;

    async fn insert_order_item(&self, tx: Option<TxId>, item: &OrderItem) -> Result<()>;
    async fn update_order_item(&self, tx: Option<TxId>, item: &OrderItem) -> Result<()>;
    async fn get_order_item(&self, id: OrderItemId) -> Result<Option<OrderItem>>;
    async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;
    async fn delete_order_item(&self, tx: Option<TxId>, id: OrderItemId) -> Result<()>;

    // -- Returns --

    async fn insert_return(&self, tx: Option<TxId>, request: &ReturnRequest) -> Result<()>;
    async fn returns_for_item(&self, order_item_id: OrderItemId) -> Result<Vec<ReturnRequest>>;
}
