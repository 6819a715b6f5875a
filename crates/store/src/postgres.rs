//! PostgreSQL store backend.
//!
//! Conditional stock updates are single `UPDATE ... WHERE stock >= qty`
//! statements (with a CTE joining the variation and product rows), so the
//! database provides the compare-and-set guarantee. Transactions are native
//! sqlx transactions, parked in a map keyed by [`TxId`] between calls.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    CustomerId, GeoPoint, Money, OrderId, OrderItemId, ProductId, ReturnId, SellerId, VariationId,
};
use domain::{
    Cancellation, Customer, DeliveryAddress, ItemStatus, Order, OrderItem, OrderStatus,
    PaymentMethod, PaymentStatus, Product, RequestType, ReturnRequest, ReturnStatus, Seller,
    SellerStatus, Variation, VariationSelector,
};
use sqlx::postgres::{PgArguments, PgPool, PgQueryResult, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::{MarketStore, TxId};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// PostgreSQL-backed [`MarketStore`].
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    transactions: Arc<Mutex<HashMap<TxId, Transaction<'static, Postgres>>>>,
}

impl PostgresStore {
    /// Creates a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            transactions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn execute(&self, tx: Option<TxId>, query: PgQuery<'_>) -> Result<PgQueryResult> {
        match tx {
            Some(id) => {
                let mut map = self.transactions.lock().await;
                let t = map.get_mut(&id).ok_or(StoreError::UnknownTransaction(id))?;
                Ok(query.execute(&mut **t).await?)
            }
            None => Ok(query.execute(&self.pool).await?),
        }
    }

    async fn fetch_optional(&self, tx: Option<TxId>, query: PgQuery<'_>) -> Result<Option<PgRow>> {
        match tx {
            Some(id) => {
                let mut map = self.transactions.lock().await;
                let t = map.get_mut(&id).ok_or(StoreError::UnknownTransaction(id))?;
                Ok(query.fetch_optional(&mut **t).await?)
            }
            None => Ok(query.fetch_optional(&self.pool).await?),
        }
    }

    fn selector_binds(selector: &VariationSelector) -> (Option<Uuid>, Option<String>) {
        match selector {
            VariationSelector::ById(id) => (Some(id.as_uuid()), None),
            VariationSelector::ByLabel(label) => (None, Some(label.clone())),
        }
    }
}

const RESERVE_VARIATION_SQL: &str = r#"
    WITH matched AS (
        SELECT id FROM variations
        WHERE product_id = $1
          AND (($2::uuid IS NOT NULL AND id = $2)
            OR ($3::text IS NOT NULL AND (value = $3 OR title = $3 OR pack = $3)))
          AND stock >= $4
        ORDER BY position
        LIMIT 1
        FOR UPDATE
    ),
    updated AS (
        UPDATE variations v
        SET stock = v.stock - $4
        FROM matched m
        WHERE v.id = m.id
        RETURNING v.id, v.value, v.title, v.pack, v.stock, v.price_cents, v.disc_price_cents
    )
    UPDATE products p
    SET stock = GREATEST(p.stock - $4, 0)
    FROM updated u
    WHERE p.id = $1
    RETURNING u.id, u.value, u.title, u.pack, u.stock, u.price_cents, u.disc_price_cents
"#;

const RESERVE_FALLBACK_SQL: &str = r#"
    WITH first_slot AS (
        SELECT id, stock FROM variations
        WHERE product_id = $1
        ORDER BY position
        LIMIT 1
        FOR UPDATE
    ),
    updated AS (
        UPDATE variations v
        SET stock = v.stock - $2
        FROM first_slot f
        WHERE v.id = f.id AND f.stock >= $2
        RETURNING v.id, v.value, v.title, v.pack, v.stock, v.price_cents, v.disc_price_cents
    )
    UPDATE products p
    SET stock = GREATEST(p.stock - $2, 0)
    FROM updated u
    WHERE p.id = $1
    RETURNING u.id, u.value, u.title, u.pack, u.stock, u.price_cents, u.disc_price_cents
"#;

const RESTOCK_VARIATION_SQL: &str = r#"
    WITH matched AS (
        SELECT id FROM variations
        WHERE product_id = $1
          AND (($2::uuid IS NOT NULL AND id = $2)
            OR ($3::text IS NOT NULL AND (value = $3 OR title = $3 OR pack = $3)))
        ORDER BY position
        LIMIT 1
        FOR UPDATE
    ),
    updated AS (
        UPDATE variations v
        SET stock = v.stock + $4
        FROM matched m
        WHERE v.id = m.id
        RETURNING v.id
    )
    UPDATE products p
    SET stock = p.stock + $4
    FROM updated u
    WHERE p.id = $1
"#;

#[async_trait]
impl MarketStore for PostgresStore {
    async fn begin_transaction(&self) -> Result<TxId> {
        let tx = self.pool.begin().await?;
        let id = TxId::new();
        self.transactions.lock().await.insert(id, tx);
        Ok(id)
    }

    async fn commit(&self, tx: TxId) -> Result<()> {
        let t = self
            .transactions
            .lock()
            .await
            .remove(&tx)
            .ok_or(StoreError::UnknownTransaction(tx))?;
        t.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: TxId) -> Result<()> {
        let t = self
            .transactions
            .lock()
            .await
            .remove(&tx)
            .ok_or(StoreError::UnknownTransaction(tx))?;
        t.rollback().await?;
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO products (id, seller_id, name, price_cents, disc_price_cents, stock)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(product.id.as_uuid())
        .bind(product.seller_id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.disc_price.map(|m| m.cents()))
        .bind(product.stock as i32)
        .execute(&mut *tx)
        .await?;

        for (position, v) in product.variations.iter().enumerate() {
            sqlx::query(
                "INSERT INTO variations
                 (id, product_id, value, title, pack, stock, price_cents, disc_price_cents, position)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(v.id.as_uuid())
            .bind(product.id.as_uuid())
            .bind(&v.value)
            .bind(&v.title)
            .bind(&v.pack)
            .bind(v.stock as i32)
            .bind(v.price.cents())
            .bind(v.disc_price.map(|m| m.cents()))
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let Some(row) = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let variation_rows =
            sqlx::query("SELECT * FROM variations WHERE product_id = $1 ORDER BY position")
                .bind(id.as_uuid())
                .fetch_all(&self.pool)
                .await?;
        let variations = variation_rows
            .into_iter()
            .map(row_to_variation)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Product {
            id: ProductId::from_uuid(row.try_get("id")?),
            seller_id: SellerId::from_uuid(row.try_get("seller_id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            disc_price: row
                .try_get::<Option<i64>, _>("disc_price_cents")?
                .map(Money::from_cents),
            stock: row.try_get::<i32, _>("stock")? as u32,
            variations,
        }))
    }

    async fn insert_seller(&self, seller: &Seller) -> Result<()> {
        sqlx::query(
            "INSERT INTO sellers (id, store_name, status, lat, lng, service_radius_km)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(seller.id.as_uuid())
        .bind(&seller.store_name)
        .bind(seller_status_str(seller.status))
        .bind(seller.location.map(|l| l.lat))
        .bind(seller.location.map(|l| l.lng))
        .bind(seller.service_radius_km)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_seller(&self, id: SellerId) -> Result<Option<Seller>> {
        sqlx::query("SELECT * FROM sellers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(row_to_seller)
            .transpose()
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query("INSERT INTO customers (id, name, phone) VALUES ($1, $2, $3)")
            .bind(customer.id.as_uuid())
            .bind(&customer.name)
            .bind(&customer.phone)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| {
            Ok(Customer {
                id: CustomerId::from_uuid(r.try_get("id")?),
                name: r.try_get("name")?,
                phone: r.try_get("phone")?,
            })
        })
        .transpose()
    }

    async fn reserve_variation_stock(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        selector: &VariationSelector,
        qty: u32,
    ) -> Result<Option<Variation>> {
        let (by_id, by_label) = Self::selector_binds(selector);
        let query = sqlx::query(RESERVE_VARIATION_SQL)
            .bind(product_id.as_uuid())
            .bind(by_id)
            .bind(by_label)
            .bind(qty as i32);
        self.fetch_optional(tx, query)
            .await?
            .map(row_to_variation)
            .transpose()
    }

    async fn reserve_fallback_variation_stock(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        qty: u32,
    ) -> Result<Option<Variation>> {
        let query = sqlx::query(RESERVE_FALLBACK_SQL)
            .bind(product_id.as_uuid())
            .bind(qty as i32);
        self.fetch_optional(tx, query)
            .await?
            .map(row_to_variation)
            .transpose()
    }

    async fn reserve_product_stock(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        qty: u32,
    ) -> Result<bool> {
        let query = sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
            .bind(product_id.as_uuid())
            .bind(qty as i32);
        Ok(self.execute(tx, query).await?.rows_affected() == 1)
    }

    async fn restock_variation(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        selector: &VariationSelector,
        qty: u32,
    ) -> Result<bool> {
        let (by_id, by_label) = Self::selector_binds(selector);
        let query = sqlx::query(RESTOCK_VARIATION_SQL)
            .bind(product_id.as_uuid())
            .bind(by_id)
            .bind(by_label)
            .bind(qty as i32);
        Ok(self.execute(tx, query).await?.rows_affected() >= 1)
    }

    async fn restock_product(
        &self,
        tx: Option<TxId>,
        product_id: ProductId,
        qty: u32,
    ) -> Result<()> {
        let query = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(product_id.as_uuid())
            .bind(qty as i32);
        self.execute(tx, query).await?;
        Ok(())
    }

    async fn insert_order(&self, tx: Option<TxId>, order: &Order) -> Result<()> {
        let query = sqlx::query(
            "INSERT INTO orders
             (id, customer_id, order_number, status, payment_status, payment_method,
              delivery_address, subtotal_cents, tax_cents, shipping_cents,
              platform_fee_cents, discount_cents, total_cents, item_ids,
              gateway_order_id, payment_id, cancellation, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(&order.order_number)
        .bind(order.status.as_str())
        .bind(order.payment_status.to_string())
        .bind(payment_method_str(order.payment_method))
        .bind(serde_json::to_value(&order.delivery_address)?)
        .bind(order.subtotal.cents())
        .bind(order.tax.cents())
        .bind(order.shipping.cents())
        .bind(order.platform_fee.cents())
        .bind(order.discount.cents())
        .bind(order.total.cents())
        .bind(serde_json::to_value(&order.items)?)
        .bind(&order.gateway_order_id)
        .bind(&order.payment_id)
        .bind(
            order
                .cancellation
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(order.created_at)
        .bind(order.updated_at);
        self.execute(tx, query).await?;
        Ok(())
    }

    async fn update_order(&self, tx: Option<TxId>, order: &Order) -> Result<()> {
        let query = sqlx::query(
            "UPDATE orders SET
               status = $2, payment_status = $3,
               subtotal_cents = $4, tax_cents = $5, shipping_cents = $6,
               platform_fee_cents = $7, discount_cents = $8, total_cents = $9,
               item_ids = $10, gateway_order_id = $11, payment_id = $12,
               cancellation = $13, updated_at = $14
             WHERE id = $1",
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.payment_status.to_string())
        .bind(order.subtotal.cents())
        .bind(order.tax.cents())
        .bind(order.shipping.cents())
        .bind(order.platform_fee.cents())
        .bind(order.discount.cents())
        .bind(order.total.cents())
        .bind(serde_json::to_value(&order.items)?)
        .bind(&order.gateway_order_id)
        .bind(&order.payment_id)
        .bind(
            order
                .cancellation
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(order.updated_at);

        if self.execute(tx, query).await?.rows_affected() == 0 {
            return Err(StoreError::MissingRecord {
                kind: "order",
                id: order.id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(row_to_order)
            .transpose()
    }

    async fn delete_order(&self, tx: Option<TxId>, id: OrderId) -> Result<()> {
        let query = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id.as_uuid());
        self.execute(tx, query).await?;
        Ok(())
    }

    async fn insert_order_item(&self, tx: Option<TxId>, item: &OrderItem) -> Result<()> {
        let query = sqlx::query(
            "INSERT INTO order_items
             (id, order_id, product_id, seller_id, product_name, unit_price_cents,
              quantity, total_cents, variation, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(item.id.as_uuid())
        .bind(item.order_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.seller_id.as_uuid())
        .bind(&item.product_name)
        .bind(item.unit_price.cents())
        .bind(item.quantity as i32)
        .bind(item.total.cents())
        .bind(&item.variation)
        .bind(item.status.to_string());
        self.execute(tx, query).await?;
        Ok(())
    }

    async fn update_order_item(&self, tx: Option<TxId>, item: &OrderItem) -> Result<()> {
        let query = sqlx::query("UPDATE order_items SET status = $2 WHERE id = $1")
            .bind(item.id.as_uuid())
            .bind(item.status.to_string());

        if self.execute(tx, query).await?.rows_affected() == 0 {
            return Err(StoreError::MissingRecord {
                kind: "order item",
                id: item.id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_order_item(&self, id: OrderItemId) -> Result<Option<OrderItem>> {
        sqlx::query("SELECT * FROM order_items WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(row_to_order_item)
            .transpose()
    }

    async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        sqlx::query("SELECT * FROM order_items WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(row_to_order_item)
            .collect()
    }

    async fn delete_order_item(&self, tx: Option<TxId>, id: OrderItemId) -> Result<()> {
        let query = sqlx::query("DELETE FROM order_items WHERE id = $1").bind(id.as_uuid());
        self.execute(tx, query).await?;
        Ok(())
    }

    async fn insert_return(&self, tx: Option<TxId>, request: &ReturnRequest) -> Result<()> {
        let query = sqlx::query(
            "INSERT INTO returns
             (id, order_id, order_item_id, customer_id, request_type, reason,
              status, quantity, images, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(request.id.as_uuid())
        .bind(request.order_id.as_uuid())
        .bind(request.order_item_id.as_uuid())
        .bind(request.customer_id.as_uuid())
        .bind(request.request_type.to_string())
        .bind(&request.reason)
        .bind(request.status.as_str())
        .bind(request.quantity as i32)
        .bind(serde_json::to_value(&request.images)?)
        .bind(request.created_at);
        self.execute(tx, query).await?;
        Ok(())
    }

    async fn returns_for_item(&self, order_item_id: OrderItemId) -> Result<Vec<ReturnRequest>> {
        sqlx::query("SELECT * FROM returns WHERE order_item_id = $1")
            .bind(order_item_id.as_uuid())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(row_to_return)
            .collect()
    }
}

// -- Row mapping --

fn row_to_variation(row: PgRow) -> Result<Variation> {
    Ok(Variation {
        id: VariationId::from_uuid(row.try_get("id")?),
        value: row.try_get("value")?,
        title: row.try_get("title")?,
        pack: row.try_get("pack")?,
        stock: row.try_get::<i32, _>("stock")? as u32,
        price: Money::from_cents(row.try_get("price_cents")?),
        disc_price: row
            .try_get::<Option<i64>, _>("disc_price_cents")?
            .map(Money::from_cents),
    })
}

fn row_to_seller(row: PgRow) -> Result<Seller> {
    let lat: Option<f64> = row.try_get("lat")?;
    let lng: Option<f64> = row.try_get("lng")?;
    let status: String = row.try_get("status")?;
    Ok(Seller {
        id: SellerId::from_uuid(row.try_get("id")?),
        store_name: row.try_get("store_name")?,
        status: parse_seller_status(&status)?,
        location: lat.zip(lng).map(|(lat, lng)| GeoPoint::new(lat, lng)),
        service_radius_km: row.try_get("service_radius_km")?,
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let payment_status: String = row.try_get("payment_status")?;
    let payment_method: String = row.try_get("payment_method")?;
    let address: serde_json::Value = row.try_get("delivery_address")?;
    let item_ids: serde_json::Value = row.try_get("item_ids")?;
    let cancellation: Option<serde_json::Value> = row.try_get("cancellation")?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        customer_id: CustomerId::from_uuid(row.try_get("customer_id")?),
        order_number: row.try_get("order_number")?,
        status: parse_order_status(&status)?,
        payment_status: parse_payment_status(&payment_status)?,
        payment_method: parse_payment_method(&payment_method)?,
        delivery_address: serde_json::from_value::<DeliveryAddress>(address)?,
        subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
        tax: Money::from_cents(row.try_get("tax_cents")?),
        shipping: Money::from_cents(row.try_get("shipping_cents")?),
        platform_fee: Money::from_cents(row.try_get("platform_fee_cents")?),
        discount: Money::from_cents(row.try_get("discount_cents")?),
        total: Money::from_cents(row.try_get("total_cents")?),
        items: serde_json::from_value(item_ids)?,
        gateway_order_id: row.try_get("gateway_order_id")?,
        payment_id: row.try_get("payment_id")?,
        cancellation: cancellation
            .map(serde_json::from_value::<Cancellation>)
            .transpose()?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
    let status: String = row.try_get("status")?;
    Ok(OrderItem {
        id: OrderItemId::from_uuid(row.try_get("id")?),
        order_id: OrderId::from_uuid(row.try_get("order_id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        seller_id: SellerId::from_uuid(row.try_get("seller_id")?),
        product_name: row.try_get("product_name")?,
        unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        total: Money::from_cents(row.try_get("total_cents")?),
        variation: row.try_get("variation")?,
        status: parse_item_status(&status)?,
    })
}

fn row_to_return(row: PgRow) -> Result<ReturnRequest> {
    let request_type: String = row.try_get("request_type")?;
    let status: String = row.try_get("status")?;
    let images: serde_json::Value = row.try_get("images")?;
    Ok(ReturnRequest {
        id: ReturnId::from_uuid(row.try_get("id")?),
        order_id: OrderId::from_uuid(row.try_get("order_id")?),
        order_item_id: OrderItemId::from_uuid(row.try_get("order_item_id")?),
        customer_id: CustomerId::from_uuid(row.try_get("customer_id")?),
        request_type: parse_request_type(&request_type)?,
        reason: row.try_get("reason")?,
        status: parse_return_status(&status)?,
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        images: serde_json::from_value(images)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

// -- Status text mapping --

fn payment_method_str(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "cash",
        PaymentMethod::Online => "online",
    }
}

fn seller_status_str(status: SellerStatus) -> &'static str {
    match status {
        SellerStatus::Active => "active",
        SellerStatus::Suspended => "suspended",
    }
}

fn parse_seller_status(s: &str) -> Result<SellerStatus> {
    match s {
        "active" => Ok(SellerStatus::Active),
        "suspended" => Ok(SellerStatus::Suspended),
        other => Err(StoreError::Corrupt(format!("seller status '{other}'"))),
    }
}

fn parse_order_status(s: &str) -> Result<OrderStatus> {
    match s {
        "Received" => Ok(OrderStatus::Received),
        "Pending" => Ok(OrderStatus::Pending),
        "Processed" => Ok(OrderStatus::Processed),
        "Shipped" => Ok(OrderStatus::Shipped),
        "Out for Delivery" => Ok(OrderStatus::OutForDelivery),
        "Delivered" => Ok(OrderStatus::Delivered),
        "Cancelled" => Ok(OrderStatus::Cancelled),
        "Rejected" => Ok(OrderStatus::Rejected),
        "Returned" => Ok(OrderStatus::Returned),
        other => Err(StoreError::Corrupt(format!("order status '{other}'"))),
    }
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus> {
    match s {
        "Pending" => Ok(PaymentStatus::Pending),
        "Paid" => Ok(PaymentStatus::Paid),
        "Failed" => Ok(PaymentStatus::Failed),
        "Refunded" => Ok(PaymentStatus::Refunded),
        other => Err(StoreError::Corrupt(format!("payment status '{other}'"))),
    }
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod> {
    match s {
        "cash" => Ok(PaymentMethod::Cash),
        "online" => Ok(PaymentMethod::Online),
        other => Err(StoreError::Corrupt(format!("payment method '{other}'"))),
    }
}

fn parse_item_status(s: &str) -> Result<ItemStatus> {
    match s {
        "Pending" => Ok(ItemStatus::Pending),
        "Shipped" => Ok(ItemStatus::Shipped),
        "Delivered" => Ok(ItemStatus::Delivered),
        "Cancelled" => Ok(ItemStatus::Cancelled),
        "Returned" => Ok(ItemStatus::Returned),
        other => Err(StoreError::Corrupt(format!("item status '{other}'"))),
    }
}

fn parse_request_type(s: &str) -> Result<RequestType> {
    match s {
        "Return" => Ok(RequestType::Return),
        "Replacement" => Ok(RequestType::Replacement),
        other => Err(StoreError::Corrupt(format!("request type '{other}'"))),
    }
}

fn parse_return_status(s: &str) -> Result<ReturnStatus> {
    match s {
        "Pending" => Ok(ReturnStatus::Pending),
        "Approved" => Ok(ReturnStatus::Approved),
        "Rejected" => Ok(ReturnStatus::Rejected),
        "Processing" => Ok(ReturnStatus::Processing),
        "Picked Up" => Ok(ReturnStatus::PickedUp),
        "Completed" => Ok(ReturnStatus::Completed),
        other => Err(StoreError::Corrupt(format!("return status '{other}'"))),
    }
}
