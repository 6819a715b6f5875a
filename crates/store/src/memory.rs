//! In-memory store backend.
//!
//! State lives behind a single `tokio::sync::RwLock`; every conditional
//! stock update runs inside one write-lock critical section, which gives the
//! compare-and-set guarantee the reservation engine depends on. Transactions
//! are an undo log replayed on rollback, so concurrent writers outside the
//! transaction are never clobbered.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CustomerId, OrderId, OrderItemId, ProductId, SellerId, VariationId};
use domain::{
    Customer, Order, OrderItem, Product, ReturnRequest, Seller, Variation, VariationSelector,
};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::{MarketStore, TxId};

enum UndoOp {
    /// Re-apply a stock delta (inverse of the original mutation).
    AdjustStock {
        product_id: ProductId,
        variation_id: Option<VariationId>,
        product_delta: i64,
        variation_delta: i64,
    },
    RemoveOrder(OrderId),
    RestoreOrder(Box<Order>),
    RemoveOrderItem(OrderItemId),
    RestoreOrderItem(Box<OrderItem>),
    RemoveReturn(common::ReturnId),
}

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    sellers: HashMap<SellerId, Seller>,
    customers: HashMap<CustomerId, Customer>,
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderItemId, OrderItem>,
    returns: HashMap<common::ReturnId, ReturnRequest>,
    transactions: HashMap<TxId, Vec<UndoOp>>,
}

impl State {
    fn check_tx(&self, tx: Option<TxId>) -> Result<()> {
        if let Some(id) = tx
            && !self.transactions.contains_key(&id)
        {
            return Err(StoreError::UnknownTransaction(id));
        }
        Ok(())
    }

    fn log_undo(&mut self, tx: Option<TxId>, op: UndoOp) {
        if let Some(id) = tx
            && let Some(log) = self.transactions.get_mut(&id)
        {
            log.push(op);
        }
    }

    fn apply_undo(&mut self, op: UndoOp) {
        match op {
            UndoOp::AdjustStock {
                product_id,
                variation_id,
                product_delta,
                variation_delta,
            } => {
                if let Some(product) = self.products.get_mut(&product_id) {
                    product.stock = add_delta(product.stock, product_delta);
                    if let Some(vid) = variation_id
                        && let Some(v) = product.variations.iter_mut().find(|v| v.id == vid)
                    {
                        v.stock = add_delta(v.stock, variation_delta);
                    }
                }
            }
            UndoOp::RemoveOrder(id) => {
                self.orders.remove(&id);
            }
            UndoOp::RestoreOrder(order) => {
                self.orders.insert(order.id, *order);
            }
            UndoOp::RemoveOrderItem(id) => {
                self.order_items.remove(&id);
            }
            UndoOp::RestoreOrderItem(item) => {
                self.order_items.insert(item.id, *item);
            }
            UndoOp::RemoveReturn(id) => {
                self.returns.remove(&id);
            }
        }
    }
}

fn add_delta(stock: u32, delta: i64) -> u32 {
    (i64::from(stock) + delta).max(0) as u32
}

/// In-memory [`MarketStore`] backend.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    transactions_enabled: bool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a store with transaction support.
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            transactions_enabled: true,
        }
    }

    /// Creates a store whose capability probe fails, exercising the
    /// best-effort placement path.
    pub fn without_transactions() -> Self {
        Self {
            state: Arc::default(),
            transactions_enabled: false,
        }
    }

    /// Returns the number of open transactions.
    pub async fn open_transaction_count(&self) -> usize {
        self.state.read().await.transactions.len()
    }
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn begin_transaction(&self) -> Result<TxId> {
        if !self.transactions_enabled {
            return Err(StoreError::TransactionUnsupported);
        }
        let id = TxId::new();
        self.state
            .write()
            .await
            .transactions
            .insert(id, Vec::new());
        Ok(id)
    }

    async fn commit(&self, tx: TxId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .transactions
            .remove(&tx)
            .ok_or(StoreError::UnknownTransaction(tx))?;
        Ok(())
    }

    async fn rollback(&self, tx: TxId) -> Result<()> {
        let mut state = self.state.write().await;
        let log = state
            .transactions
            .remove(&tx)
            .ok_or(StoreError::UnknownTransaction(tx))?;
        for op in log.into_iter().rev() {
            state.apply_undo(op);
        }
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.state
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn insert_seller(&self, seller: &Seller) -> Result<()> {
        self.state
            .write()
            .await
            .sellers
            .insert(seller.id, seller.clone());
        Ok(())
    }

    async fn get_seller(&self, id: SellerId) -> Result<Option<Seller>> {
        Ok(self.state.read().await.sellers.get(&id).cloned())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        self.state
            .write()
            .await
            .customers
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.state.read().await.customers.get(&id).cloned())
    }

    async fn reserve_variation_stock(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        selector: &VariationSelector,
        qty: u32,
    ) -> Result<Option<Variation>> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;

        let Some(product) = state.products.get_mut(&product_id) else {
            return Ok(None);
        };
        let Some(variation) = product
            .variations
            .iter_mut()
            .find(|v| v.matches(selector) && v.stock >= qty)
        else {
            return Ok(None);
        };

        variation.stock -= qty;
        let snapshot = variation.clone();
        product.stock = product.stock.saturating_sub(qty);

        state.log_undo(
            tx,
            UndoOp::AdjustStock {
                product_id,
                variation_id: Some(snapshot.id),
                product_delta: i64::from(qty),
                variation_delta: i64::from(qty),
            },
        );
        Ok(Some(snapshot))
    }

    async fn reserve_fallback_variation_stock(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        qty: u32,
    ) -> Result<Option<Variation>> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;

        let Some(product) = state.products.get_mut(&product_id) else {
            return Ok(None);
        };
        let Some(variation) = product.variations.first_mut() else {
            return Ok(None);
        };
        if variation.stock < qty {
            return Ok(None);
        }

        variation.stock -= qty;
        let snapshot = variation.clone();
        product.stock = product.stock.saturating_sub(qty);

        state.log_undo(
            tx,
            UndoOp::AdjustStock {
                product_id,
                variation_id: Some(snapshot.id),
                product_delta: i64::from(qty),
                variation_delta: i64::from(qty),
            },
        );
        Ok(Some(snapshot))
    }

    async fn reserve_product_stock(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        qty: u32,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;

        let Some(product) = state.products.get_mut(&product_id) else {
            return Ok(false);
        };
        if product.stock < qty {
            return Ok(false);
        }

        product.stock -= qty;
        state.log_undo(
            tx,
            UndoOp::AdjustStock {
                product_id,
                variation_id: None,
                product_delta: i64::from(qty),
                variation_delta: 0,
            },
        );
        Ok(true)
    }

    async fn restock_variation(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        selector: &VariationSelector,
        qty: u32,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;

        let Some(product) = state.products.get_mut(&product_id) else {
            tracing::warn!(%product_id, "restock target product no longer exists");
            return Ok(false);
        };
        let Some(variation) = product.variations.iter_mut().find(|v| v.matches(selector)) else {
            return Ok(false);
        };

        variation.stock += qty;
        let variation_id = variation.id;
        product.stock += qty;

        state.log_undo(
            tx,
            UndoOp::AdjustStock {
                product_id,
                variation_id: Some(variation_id),
                product_delta: -i64::from(qty),
                variation_delta: -i64::from(qty),
            },
        );
        Ok(true)
    }

    async fn restock_product(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        qty: u32,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;

        let Some(product) = state.products.get_mut(&product_id) else {
            tracing::warn!(%product_id, "restock target product no longer exists");
            return Ok(());
        };
        product.stock += qty;
        state.log_undo(
            tx,
            UndoOp::AdjustStock {
                product_id,
                variation_id: None,
                product_delta: -i64::from(qty),
                variation_delta: 0,
            },
        );
        Ok(())
    }

    async fn insert_order(&self, tx: Option<TxId>, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        state.orders.insert(order.id, order.clone());
        state.log_undo(tx, UndoOp::RemoveOrder(order.id));
        Ok(())
    }

    async fn update_order(&self, tx: Option<TxId>, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        let previous = state
            .orders
            .insert(order.id, order.clone())
            .ok_or(StoreError::MissingRecord {
                kind: "order",
                id: order.id.to_string(),
            })?;
        state.log_undo(tx, UndoOp::RestoreOrder(Box::new(previous)));
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn delete_order(&self, tx: Option<TxId>, id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        if let Some(previous) = state.orders.remove(&id) {
            state.log_undo(tx, UndoOp::RestoreOrder(Box::new(previous)));
        }
        Ok(())
    }

    async fn insert_order_item(&self, tx: Option<TxId>, item: &OrderItem) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        state.order_items.insert(item.id, item.clone());
        state.log_undo(tx, UndoOp::RemoveOrderItem(item.id));
        Ok(())
    }

    async fn update_order_item(&self, tx: Option<TxId>, item: &OrderItem) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        let previous = state
            .order_items
            .insert(item.id, item.clone())
            .ok_or(StoreError::MissingRecord {
                kind: "order item",
                id: item.id.to_string(),
            })?;
        state.log_undo(tx, UndoOp::RestoreOrderItem(Box::new(previous)));
        Ok(())
    }

    async fn get_order_item(&self, id: OrderItemId) -> Result<Option<OrderItem>> {
        Ok(self.state.read().await.order_items.get(&id).cloned())
    }

    async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        Ok(self
            .state
            .read()
            .await
            .order_items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn delete_order_item(&self, tx: Option<TxId>, id: OrderItemId) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        if let Some(previous) = state.order_items.remove(&id) {
            state.log_undo(tx, UndoOp::RestoreOrderItem(Box::new(previous)));
        }
        Ok(())
    }

    async fn insert_return(&self, tx: Option<TxId>, request: &ReturnRequest) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_tx(tx)?;
        state.returns.insert(request.id, request.clone());
        state.log_undo(tx, UndoOp::RemoveReturn(request.id));
        Ok(())
    }

    async fn returns_for_item(&self, order_item_id: OrderItemId) -> Result<Vec<ReturnRequest>> {
        Ok(self
            .state
            .read()
            .await
            .returns
            .values()
            .filter(|r| r.order_item_id == order_item_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn variation(label: &str, stock: u32) -> Variation {
        Variation {
            id: VariationId::new(),
            value: Some(label.to_string()),
            title: None,
            pack: None,
            stock,
            price: Money::from_major(100),
            disc_price: None,
        }
    }

    fn plain_product(stock: u32) -> Product {
        Product {
            id: ProductId::new(),
            seller_id: SellerId::new(),
            name: "Rice".to_string(),
            price: Money::from_major(60),
            disc_price: None,
            stock,
            variations: vec![],
        }
    }

    fn varied_product(stocks: &[(&str, u32)], top: u32) -> Product {
        Product {
            id: ProductId::new(),
            seller_id: SellerId::new(),
            name: "Tea".to_string(),
            price: Money::from_major(100),
            disc_price: None,
            stock: top,
            variations: stocks.iter().map(|(l, s)| variation(l, *s)).collect(),
        }
    }

    #[tokio::test]
    async fn product_stock_boundary() {
        let store = InMemoryStore::new();
        let product = plain_product(5);
        store.insert_product(&product).await.unwrap();

        assert!(store.reserve_product_stock(None, product.id, 5).await.unwrap());
        assert!(!store.reserve_product_stock(None, product.id, 1).await.unwrap());
        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn variation_reserve_decrements_both_levels() {
        let store = InMemoryStore::new();
        let product = varied_product(&[("250g", 4), ("500g", 6)], 10);
        store.insert_product(&product).await.unwrap();

        let got = store
            .reserve_variation_stock(
                None,
                product.id,
                &VariationSelector::ByLabel("500g".into()),
                2,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.value.as_deref(), Some("500g"));
        assert_eq!(got.stock, 4);

        let stored = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 8);
        assert_eq!(stored.variations[0].stock, 4);
        assert_eq!(stored.variations[1].stock, 4);
    }

    #[tokio::test]
    async fn variation_reserve_fails_on_insufficient_or_unmatched() {
        let store = InMemoryStore::new();
        let product = varied_product(&[("250g", 1)], 1);
        store.insert_product(&product).await.unwrap();

        let short = store
            .reserve_variation_stock(
                None,
                product.id,
                &VariationSelector::ByLabel("250g".into()),
                2,
            )
            .await
            .unwrap();
        assert!(short.is_none());

        let unmatched = store
            .reserve_variation_stock(
                None,
                product.id,
                &VariationSelector::ByLabel("1kg".into()),
                1,
            )
            .await
            .unwrap();
        assert!(unmatched.is_none());

        // Nothing moved.
        let stored = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 1);
        assert_eq!(stored.variations[0].stock, 1);
    }

    #[tokio::test]
    async fn fallback_uses_only_the_first_slot() {
        let store = InMemoryStore::new();
        let product = varied_product(&[("250g", 1), ("500g", 9)], 10);
        store.insert_product(&product).await.unwrap();

        // First slot has only 1; qty 2 must fail even though slot two has 9.
        let miss = store
            .reserve_fallback_variation_stock(None, product.id, 2)
            .await
            .unwrap();
        assert!(miss.is_none());

        let hit = store
            .reserve_fallback_variation_stock(None, product.id, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.value.as_deref(), Some("250g"));
    }

    #[tokio::test]
    async fn restock_variation_double_increments() {
        let store = InMemoryStore::new();
        let product = varied_product(&[("250g", 3)], 3);
        store.insert_product(&product).await.unwrap();

        let ok = store
            .restock_variation(
                None,
                product.id,
                &VariationSelector::ByLabel("250g".into()),
                2,
            )
            .await
            .unwrap();
        assert!(ok);

        let stored = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 5);
        assert_eq!(stored.variations[0].stock, 5);
    }

    #[tokio::test]
    async fn rollback_restores_stock_and_removes_records() {
        let store = InMemoryStore::new();
        let product = plain_product(5);
        store.insert_product(&product).await.unwrap();

        let tx = store.begin_transaction().await.unwrap();
        assert!(store.reserve_product_stock(Some(tx), product.id, 3).await.unwrap());

        let order = Order::shell(
            CustomerId::new(),
            test_address(),
            domain::PaymentMethod::Cash,
            domain::OrderStatus::Received,
        );
        store.insert_order(Some(tx), &order).await.unwrap();

        store.rollback(tx).await.unwrap();

        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 5);
        assert!(store.get_order(order.id).await.unwrap().is_none());
        assert_eq!(store.open_transaction_count().await, 0);
    }

    #[tokio::test]
    async fn commit_keeps_changes() {
        let store = InMemoryStore::new();
        let product = plain_product(5);
        store.insert_product(&product).await.unwrap();

        let tx = store.begin_transaction().await.unwrap();
        assert!(store.reserve_product_stock(Some(tx), product.id, 3).await.unwrap());
        store.commit(tx).await.unwrap();

        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn closed_transaction_is_rejected() {
        let store = InMemoryStore::new();
        let product = plain_product(5);
        store.insert_product(&product).await.unwrap();

        let tx = store.begin_transaction().await.unwrap();
        store.commit(tx).await.unwrap();

        let err = store
            .reserve_product_stock(Some(tx), product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownTransaction(_)));
    }

    #[tokio::test]
    async fn default_store_supports_transactions() {
        let store = InMemoryStore::default();
        let tx = store.begin_transaction().await.unwrap();
        store.commit(tx).await.unwrap();
    }

    #[tokio::test]
    async fn capability_probe_can_fail() {
        let store = InMemoryStore::without_transactions();
        assert!(matches!(
            store.begin_transaction().await,
            Err(StoreError::TransactionUnsupported)
        ));
    }

    #[tokio::test]
    async fn concurrent_unit_reservations_never_oversell() {
        let store = InMemoryStore::new();
        let product = plain_product(5);
        store.insert_product(&product).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            let id = product.id;
            handles.push(tokio::spawn(async move {
                store.reserve_product_stock(None, id, 1).await.unwrap()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 5);
        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 0);
    }

    fn test_address() -> domain::DeliveryAddress {
        domain::DeliveryAddress {
            address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "KA".to_string(),
            pincode: "560001".to_string(),
            landmark: None,
            location: common::GeoPoint::new(12.97, 77.59),
        }
    }
}
