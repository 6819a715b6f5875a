//! The checkout engine: placement, online payment, cancellation and returns.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::{Money, OrderId, OrderItemId, ReturnId, SellerId};
use domain::{
    check_service_area, compute_totals, Cancellation, DiscountConfig, ItemStatus, Order, OrderItem,
    OrderStatus, PaymentMethod, PaymentStatus, Product, ReturnRequest, ReturnStatus, Seller,
    SellerStatus, VariationSelector,
};
use store::MarketStore;

use crate::coordinator::{Compensation, UnitOfWork};
use crate::error::{CheckoutError, Result};
use crate::gateway::PaymentGateway;
use crate::notify::{Notification, NotificationDispatcher};
use crate::request::{CancelOrder, PlaceOrderRequest, ReturnOrReplaceRequest};
use crate::reservation::{reserve_line, ReservedLine};

/// A placed order together with its persisted line items.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Result of initiating an online payment: the pending order plus the
/// gateway session the client completes the payment against.
#[derive(Debug, Clone)]
pub struct PaymentInit {
    pub order: Order,
    pub gateway_order_id: String,
    pub amount: Money,
}

/// Drives the customer-facing order flows against the store, the payment
/// gateway and the notification channel.
pub struct CheckoutEngine {
    store: Arc<dyn MarketStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationDispatcher>,
    config: DiscountConfig,
}

impl CheckoutEngine {
    /// Creates a new engine.
    pub fn new(
        store: Arc<dyn MarketStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationDispatcher>,
        config: DiscountConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            config,
        }
    }

    /// Places a cash-on-delivery order.
    ///
    /// Reserves stock for every line, prices the order and persists it in
    /// `Received` state, all inside one unit of work.
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<OrderReceipt> {
        if request.payment_method != PaymentMethod::Cash {
            return Err(CheckoutError::Validation(
                "online orders go through the payment initiation flow".to_string(),
            ));
        }

        let started = Instant::now();
        let (uow, _compensation, order, items) =
            self.build(&request, OrderStatus::Received).await?;
        uow.commit(self.store.as_ref()).await?;

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_placement_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, order_number = %order.order_number, "order placed");

        self.notify(Notification::OrderPlaced {
            order_id: order.id,
            order_number: order.order_number.clone(),
        });
        self.notify_sellers(order.id, &items);
        Ok(OrderReceipt { order, items })
    }

    /// Places an online order in `Pending` state and opens a gateway session
    /// for its grand total.
    ///
    /// A gateway failure releases everything the placement reserved.
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn initiate_online_payment(
        &self,
        mut request: PlaceOrderRequest,
    ) -> Result<PaymentInit> {
        request.payment_method = PaymentMethod::Online;

        let started = Instant::now();
        let (uow, compensation, mut order, _items) =
            self.build(&request, OrderStatus::Pending).await?;
        let store = self.store.as_ref();

        let session = match self
            .gateway
            .create_order(order.total, &order.order_number)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "gateway session failed, releasing reservation");
                metrics::counter!("orders_failed_total").increment(1);
                uow.abort(store, compensation).await;
                return Err(e);
            }
        };

        order.gateway_order_id = Some(session.gateway_order_id.clone());
        order.updated_at = Utc::now();
        if let Err(e) = store.update_order(uow.tx(), &order).await {
            uow.abort(store, compensation).await;
            return Err(e.into());
        }
        uow.commit(store).await?;

        metrics::counter!("payments_initiated_total").increment(1);
        metrics::histogram!("order_placement_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, gateway_order_id = %session.gateway_order_id, "online payment initiated");

        Ok(PaymentInit {
            order,
            gateway_order_id: session.gateway_order_id,
            amount: session.amount,
        })
    }

    /// Settles a pending online order from the gateway callback.
    ///
    /// A valid signature marks the order paid and moves it to `Received`.
    /// An invalid one marks the payment failed and leaves the order pending,
    /// so a retried callback can still settle it.
    #[tracing::instrument(skip(self, signature))]
    pub async fn verify_payment(
        &self,
        order_id: OrderId,
        payment_id: &str,
        signature: &str,
    ) -> Result<Order> {
        let store = self.store.as_ref();
        let mut order = store
            .get_order(order_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound {
                kind: "order",
                id: order_id.to_string(),
            })?;
        let gateway_order_id =
            order
                .gateway_order_id
                .clone()
                .ok_or_else(|| CheckoutError::Validation(
                    "order has no payment session".to_string(),
                ))?;

        // A replayed callback for an already settled order is a no-op.
        if order.payment_status == PaymentStatus::Paid {
            return Ok(order);
        }

        let valid = self
            .gateway
            .verify_signature(&gateway_order_id, payment_id, signature)
            .await?;
        if !valid {
            order.payment_status = PaymentStatus::Failed;
            order.updated_at = Utc::now();
            store.update_order(None, &order).await?;
            metrics::counter!("payments_failed_total").increment(1);
            tracing::warn!(%order_id, "payment signature rejected");
            return Err(CheckoutError::Gateway(
                "payment signature verification failed".to_string(),
            ));
        }

        order.payment_status = PaymentStatus::Paid;
        order.status = OrderStatus::Received;
        order.payment_id = Some(payment_id.to_string());
        order.updated_at = Utc::now();
        store.update_order(None, &order).await?;

        metrics::counter!("payments_verified_total").increment(1);
        tracing::info!(%order_id, "payment verified");
        self.notify(Notification::PaymentConfirmed { order_id });
        let items = store.items_for_order(order_id).await?;
        self.notify_sellers(order_id, &items);
        Ok(order)
    }

    /// Cancels an order that has not shipped, restoring the stock of every
    /// live line item at both the variation and product level.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn cancel_order(&self, cmd: CancelOrder) -> Result<Order> {
        cmd.validate()?;
        let store = self.store.as_ref();

        let mut order = store
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound {
                kind: "order",
                id: cmd.order_id.to_string(),
            })?;
        if !order.status.can_cancel() {
            return Err(CheckoutError::Validation(format!(
                "order in {} state cannot be cancelled",
                order.status
            )));
        }

        let items = store.items_for_order(cmd.order_id).await?;
        let uow = UnitOfWork::begin(store).await?;
        match self.apply_cancellation(&uow, &mut order, items, &cmd).await {
            Ok(()) => {
                uow.commit(store).await?;
                metrics::counter!("orders_cancelled_total").increment(1);
                tracing::info!(order_id = %order.id, reason = %cmd.reason, "order cancelled");
                self.notify(Notification::OrderCancelled {
                    order_id: order.id,
                    reason: cmd.reason,
                });
                Ok(order)
            }
            Err(e) => {
                uow.abort(store, Compensation::default()).await;
                Err(e)
            }
        }
    }

    /// Files a return or replacement request against a delivered order.
    ///
    /// One live request per item: only a rejected previous request frees the
    /// item for another attempt.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn request_return(&self, request: ReturnOrReplaceRequest) -> Result<ReturnRequest> {
        request.validate()?;
        let store = self.store.as_ref();

        let order = store
            .get_order(request.order_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound {
                kind: "order",
                id: request.order_id.to_string(),
            })?;
        if order.customer_id != request.customer_id {
            return Err(CheckoutError::Validation(
                "order does not belong to this customer".to_string(),
            ));
        }
        if order.status != OrderStatus::Delivered {
            return Err(CheckoutError::Validation(
                "only delivered orders can be returned or replaced".to_string(),
            ));
        }

        let item = store
            .get_order_item(request.order_item_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound {
                kind: "order item",
                id: request.order_item_id.to_string(),
            })?;
        if item.order_id != request.order_id {
            return Err(CheckoutError::Validation(
                "item does not belong to this order".to_string(),
            ));
        }
        if matches!(item.status, ItemStatus::Cancelled | ItemStatus::Returned) {
            return Err(CheckoutError::Validation(
                "item is no longer eligible for return".to_string(),
            ));
        }
        if request.quantity > item.quantity {
            return Err(CheckoutError::Validation(
                "return quantity exceeds the ordered quantity".to_string(),
            ));
        }

        let existing = store.returns_for_item(request.order_item_id).await?;
        if existing.iter().any(|r| r.status.blocks_new_request()) {
            return Err(CheckoutError::DuplicateRequest);
        }

        let record = ReturnRequest {
            id: ReturnId::new(),
            order_id: request.order_id,
            order_item_id: request.order_item_id,
            customer_id: request.customer_id,
            request_type: request.request_type,
            reason: request.reason,
            status: ReturnStatus::Pending,
            quantity: request.quantity,
            images: request.images,
            created_at: Utc::now(),
        };
        store.insert_return(None, &record).await?;

        metrics::counter!("return_requests_total").increment(1);
        tracing::info!(return_id = %record.id, kind = %record.request_type, "return request filed");
        self.notify(Notification::ReturnRequested {
            return_id: record.id,
            request_type: record.request_type,
        });
        Ok(record)
    }

    /// Fetches an order and its line items.
    pub async fn get_order(&self, order_id: OrderId) -> Result<OrderReceipt> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound {
                kind: "order",
                id: order_id.to_string(),
            })?;
        let items = self.store.items_for_order(order_id).await?;
        Ok(OrderReceipt { order, items })
    }

    /// Validates, reserves and persists a placement inside a fresh unit of
    /// work. On failure the unit is aborted here; on success the caller owns
    /// committing (or aborting with the returned compensation).
    async fn build(
        &self,
        request: &PlaceOrderRequest,
        status: OrderStatus,
    ) -> Result<(UnitOfWork, Compensation, Order, Vec<OrderItem>)> {
        request.validate()?;
        let store = self.store.as_ref();

        if store.get_customer(request.customer_id).await?.is_none() {
            return Err(CheckoutError::NotFound {
                kind: "customer",
                id: request.customer_id.to_string(),
            });
        }

        // Load every product once; reservation and pricing reuse the copies.
        let mut products = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = store.get_product(line.product_id).await?.ok_or_else(|| {
                CheckoutError::NotFound {
                    kind: "product",
                    id: line.product_id.to_string(),
                }
            })?;
            products.push(product);
        }

        // Every seller involved must be active and must cover the address.
        let mut sellers: Vec<Seller> = Vec::new();
        for product in &products {
            if sellers.iter().any(|s| s.id == product.seller_id) {
                continue;
            }
            let seller = store.get_seller(product.seller_id).await?.ok_or_else(|| {
                CheckoutError::NotFound {
                    kind: "seller",
                    id: product.seller_id.to_string(),
                }
            })?;
            if seller.status != SellerStatus::Active {
                return Err(CheckoutError::Validation(format!(
                    "seller '{}' is not accepting orders",
                    seller.store_name
                )));
            }
            sellers.push(seller);
        }
        check_service_area(&request.delivery_address.location, &sellers)?;

        let uow = UnitOfWork::begin(store).await?;
        let mut compensation = Compensation::default();
        match self
            .reserve_and_persist(&uow, request, status, &products, &mut compensation)
            .await
        {
            Ok((order, items)) => Ok((uow, compensation, order, items)),
            Err(e) => {
                metrics::counter!("orders_failed_total").increment(1);
                uow.abort(store, compensation).await;
                Err(e)
            }
        }
    }

    async fn reserve_and_persist(
        &self,
        uow: &UnitOfWork,
        request: &PlaceOrderRequest,
        status: OrderStatus,
        products: &[Product],
        compensation: &mut Compensation,
    ) -> Result<(Order, Vec<OrderItem>)> {
        let store = self.store.as_ref();
        let tx = uow.tx();

        let mut lines: Vec<ReservedLine> = Vec::with_capacity(request.items.len());
        for (line, product) in request.items.iter().zip(products) {
            let (reserved, claim) = reserve_line(store, tx, line, product).await?;
            compensation.record_claim(claim);
            lines.push(reserved);
        }

        let paid_subtotal: Money = lines
            .iter()
            .filter(|l| !l.free_gift)
            .map(|l| l.line_total)
            .sum();
        if lines.iter().any(|l| l.free_gift) && paid_subtotal < self.config.free_gift_threshold {
            return Err(CheckoutError::Validation(format!(
                "free gift requires a subtotal of at least {}",
                self.config.free_gift_threshold
            )));
        }

        let totals = compute_totals(
            paid_subtotal,
            request.platform_fee,
            request.delivery_fee,
            request.coupon_discount,
            request.payment_method,
            self.config.online_payment_discount_pct,
        );

        let mut order = Order::shell(
            request.customer_id,
            request.delivery_address.clone(),
            request.payment_method,
            status,
        );
        order.subtotal = totals.subtotal;
        order.platform_fee = totals.platform_fee;
        order.shipping = totals.delivery_fee;
        order.discount = totals.coupon_discount + totals.online_discount;
        order.total = totals.grand_total;
        store.insert_order(tx, &order).await?;
        compensation.record_order(order.id);

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = OrderItem {
                id: OrderItemId::new(),
                order_id: order.id,
                product_id: line.product_id,
                seller_id: line.seller_id,
                product_name: line.product_name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                total: line.line_total,
                variation: line
                    .variation
                    .as_ref()
                    .and_then(|v| v.label())
                    .map(str::to_string),
                status: ItemStatus::Pending,
            };
            store.insert_order_item(tx, &item).await?;
            compensation.record_item(item.id);
            items.push(item);
        }

        order.items = items.iter().map(|i| i.id).collect();
        order.updated_at = Utc::now();
        store.update_order(tx, &order).await?;

        Ok((order, items))
    }

    async fn apply_cancellation(
        &self,
        uow: &UnitOfWork,
        order: &mut Order,
        items: Vec<OrderItem>,
        cmd: &CancelOrder,
    ) -> Result<()> {
        let store = self.store.as_ref();
        let tx = uow.tx();

        for mut item in items {
            if matches!(item.status, ItemStatus::Cancelled | ItemStatus::Returned) {
                continue;
            }
            match &item.variation {
                Some(label) => {
                    let restocked = store
                        .restock_variation(
                            tx,
                            item.product_id,
                            &VariationSelector::ByLabel(label.clone()),
                            item.quantity,
                        )
                        .await?;
                    if !restocked {
                        tracing::warn!(
                            product_id = %item.product_id,
                            label,
                            "variation missing at restock, restoring product stock only"
                        );
                        store.restock_product(tx, item.product_id, item.quantity).await?;
                    }
                }
                None => {
                    store.restock_product(tx, item.product_id, item.quantity).await?;
                }
            }
            item.status = ItemStatus::Cancelled;
            store.update_order_item(tx, &item).await?;
        }

        order.status = OrderStatus::Cancelled;
        if order.payment_status == PaymentStatus::Paid {
            order.payment_status = PaymentStatus::Refunded;
        }
        order.cancellation = Some(Cancellation {
            reason: cmd.reason.clone(),
            cancelled_at: Utc::now(),
            cancelled_by: cmd.cancelled_by.clone(),
        });
        order.updated_at = Utc::now();
        store.update_order(tx, order).await?;
        Ok(())
    }

    fn notify(&self, notification: Notification) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.dispatch(notification).await {
                tracing::warn!(error = %e, "notification dispatch failed");
            }
        });
    }

    /// Broadcasts a new-order notification to each distinct seller on the
    /// order.
    fn notify_sellers(&self, order_id: OrderId, items: &[OrderItem]) {
        let mut sellers: Vec<SellerId> = Vec::new();
        for item in items {
            if !sellers.contains(&item.seller_id) {
                sellers.push(item.seller_id);
            }
        }
        for seller_id in sellers {
            self.notify(Notification::SellerNewOrder {
                order_id,
                seller_id,
            });
        }
    }
}
