//! End-to-end tests for the checkout flows against the in-memory store.

use std::sync::Arc;

use checkout::{
    CancelOrder, CartLine, CheckoutEngine, CheckoutError, InMemoryDispatcher, InMemoryGateway,
    Notification, PlaceOrderRequest, ReturnOrReplaceRequest,
};
use common::{CustomerId, GeoPoint, Money, ProductId, SellerId, VariationId};
use domain::{
    Customer, DeliveryAddress, DiscountConfig, ItemStatus, OrderStatus, PaymentMethod,
    PaymentStatus, Product, RequestType, Seller, SellerStatus, Variation, VariationSelector,
};
use store::{InMemoryStore, MarketStore};

const BENGALURU: GeoPoint = GeoPoint {
    lat: 12.9716,
    lng: 77.5946,
};

struct Fixture {
    engine: Arc<CheckoutEngine>,
    store: Arc<InMemoryStore>,
    gateway: InMemoryGateway,
    dispatcher: InMemoryDispatcher,
    customer_id: CustomerId,
    seller_id: SellerId,
}

async fn setup(store: InMemoryStore, config: DiscountConfig) -> Fixture {
    let store = Arc::new(store);
    let gateway = InMemoryGateway::new();
    let dispatcher = InMemoryDispatcher::new();

    let customer_id = CustomerId::new();
    store
        .insert_customer(&Customer {
            id: customer_id,
            name: "Asha".to_string(),
            phone: "9000000001".to_string(),
        })
        .await
        .unwrap();

    let seller_id = SellerId::new();
    store
        .insert_seller(&Seller {
            id: seller_id,
            store_name: "Fresh Farms".to_string(),
            status: SellerStatus::Active,
            location: Some(BENGALURU),
            service_radius_km: 10.0,
        })
        .await
        .unwrap();

    let engine = Arc::new(CheckoutEngine::new(
        store.clone(),
        Arc::new(gateway.clone()),
        Arc::new(dispatcher.clone()),
        config,
    ));

    Fixture {
        engine,
        store,
        gateway,
        dispatcher,
        customer_id,
        seller_id,
    }
}

fn address() -> DeliveryAddress {
    DeliveryAddress {
        address: "12 MG Road".to_string(),
        city: "Bengaluru".to_string(),
        state: "KA".to_string(),
        pincode: "560001".to_string(),
        landmark: None,
        location: BENGALURU,
    }
}

fn plain_product(seller_id: SellerId, price: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(),
        seller_id,
        name: "Wild Honey".to_string(),
        price: Money::from_major(price),
        disc_price: None,
        stock,
        variations: vec![],
    }
}

fn varied_product(seller_id: SellerId, label: &str, var_stock: u32, top: u32) -> Product {
    Product {
        id: ProductId::new(),
        seller_id,
        name: "Mountain Tea".to_string(),
        price: Money::from_major(80),
        disc_price: None,
        stock: top,
        variations: vec![Variation {
            id: VariationId::new(),
            value: Some(label.to_string()),
            title: None,
            pack: None,
            stock: var_stock,
            price: Money::from_major(120),
            disc_price: None,
        }],
    }
}

fn request(customer_id: CustomerId, items: Vec<CartLine>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer_id,
        items,
        delivery_address: address(),
        payment_method: PaymentMethod::Cash,
        platform_fee: Money::zero(),
        delivery_fee: Money::zero(),
        coupon_discount: Money::zero(),
    }
}

fn line(product_id: ProductId, quantity: u32) -> CartLine {
    CartLine {
        product_id,
        quantity,
        variant: None,
        free_gift: false,
    }
}

#[tokio::test]
async fn cash_placement_happy_path() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p = plain_product(f.seller_id, 250, 5);
    f.store.insert_product(&p).await.unwrap();

    let receipt = f
        .engine
        .place_order(request(f.customer_id, vec![line(p.id, 2)]))
        .await
        .unwrap();

    assert_eq!(receipt.order.status, OrderStatus::Received);
    assert_eq!(receipt.order.payment_status, PaymentStatus::Pending);
    assert_eq!(receipt.order.subtotal, Money::from_major(500));
    assert_eq!(receipt.order.total, Money::from_major(500));
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(receipt.order.items, vec![receipt.items[0].id]);
    assert_eq!(receipt.items[0].unit_price, Money::from_major(250));

    let after = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 3);
    assert_eq!(f.store.open_transaction_count().await, 0);

    // The placement survives a round-trip through the store.
    let fetched = f.engine.get_order(receipt.order.id).await.unwrap();
    assert_eq!(fetched.order, receipt.order);
}

#[tokio::test]
async fn online_pricing_matches_the_worked_example() {
    // subtotal 500 + platform 2 + delivery 40 - coupon 50 = 492,
    // 5% online discount = 24.60, grand total 467.40
    let config = DiscountConfig {
        online_payment_discount_pct: 5.0,
        free_gift_threshold: Money::zero(),
    };
    let f = setup(InMemoryStore::new(), config).await;
    let p = plain_product(f.seller_id, 250, 5);
    f.store.insert_product(&p).await.unwrap();

    let mut req = request(f.customer_id, vec![line(p.id, 2)]);
    req.platform_fee = Money::from_major(2);
    req.delivery_fee = Money::from_major(40);
    req.coupon_discount = Money::from_major(50);

    let init = f.engine.initiate_online_payment(req).await.unwrap();
    assert_eq!(init.amount.cents(), 46740);
    assert_eq!(init.order.total.cents(), 46740);
    assert_eq!(init.order.discount.cents(), 5000 + 2460);
    assert_eq!(init.order.status, OrderStatus::Pending);
    assert_eq!(init.order.gateway_order_id.as_deref(), Some(init.gateway_order_id.as_str()));
}

#[tokio::test]
async fn concurrent_placements_never_oversell() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p = plain_product(f.seller_id, 100, 5);
    f.store.insert_product(&p).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = f.engine.clone();
        let customer_id = f.customer_id;
        let product_id = p.id;
        handles.push(tokio::spawn(async move {
            engine
                .place_order(request(customer_id, vec![line(product_id, 1)]))
                .await
        }));
    }

    let mut placed = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(CheckoutError::InsufficientStock { .. }) => out_of_stock += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(placed, 5);
    assert_eq!(out_of_stock, 5);
    let after = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 0);
}

#[tokio::test]
async fn failed_line_rolls_back_earlier_reservations() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p1 = plain_product(f.seller_id, 100, 5);
    let mut p2 = plain_product(f.seller_id, 100, 1);
    p2.name = "Ghee".to_string();
    f.store.insert_product(&p1).await.unwrap();
    f.store.insert_product(&p2).await.unwrap();

    let err = f
        .engine
        .place_order(request(f.customer_id, vec![line(p1.id, 2), line(p2.id, 3)]))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

    // The first line's reservation was undone with the transaction.
    let after = f.store.get_product(p1.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 5);
    assert_eq!(f.store.open_transaction_count().await, 0);
}

#[tokio::test]
async fn best_effort_placement_compensates_on_failure() {
    let f = setup(InMemoryStore::without_transactions(), DiscountConfig::default()).await;
    let p1 = varied_product(f.seller_id, "500g", 5, 10);
    let mut p2 = plain_product(f.seller_id, 100, 1);
    p2.name = "Ghee".to_string();
    f.store.insert_product(&p1).await.unwrap();
    f.store.insert_product(&p2).await.unwrap();

    let mut first = line(p1.id, 2);
    first.variant = Some(VariationSelector::ByLabel("500g".to_string()));
    let err = f
        .engine
        .place_order(request(f.customer_id, vec![first, line(p2.id, 3)]))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

    // Compensating restocks restored both stock levels.
    let after = f.store.get_product(p1.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 10);
    assert_eq!(after.variations[0].stock, 5);
}

#[tokio::test]
async fn best_effort_placement_still_succeeds() {
    let f = setup(InMemoryStore::without_transactions(), DiscountConfig::default()).await;
    let p = plain_product(f.seller_id, 250, 5);
    f.store.insert_product(&p).await.unwrap();

    let receipt = f
        .engine
        .place_order(request(f.customer_id, vec![line(p.id, 1)]))
        .await
        .unwrap();
    assert_eq!(receipt.order.status, OrderStatus::Received);

    let after = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 4);
}

#[tokio::test]
async fn gateway_failure_releases_the_reservation() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p = plain_product(f.seller_id, 250, 5);
    f.store.insert_product(&p).await.unwrap();
    f.gateway.set_fail_on_create(true);

    let err = f
        .engine
        .initiate_online_payment(request(f.customer_id, vec![line(p.id, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Gateway(_)));

    let after = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 5);
    assert_eq!(f.store.open_transaction_count().await, 0);
}

#[tokio::test]
async fn payment_verification_settles_or_rejects() {
    let config = DiscountConfig {
        online_payment_discount_pct: 5.0,
        free_gift_threshold: Money::zero(),
    };
    let f = setup(InMemoryStore::new(), config).await;
    let p = plain_product(f.seller_id, 250, 5);
    f.store.insert_product(&p).await.unwrap();

    let init = f
        .engine
        .initiate_online_payment(request(f.customer_id, vec![line(p.id, 1)]))
        .await
        .unwrap();
    let order_id = init.order.id;

    // A forged signature marks the payment failed but keeps the order
    // pending, so the real callback can still settle it.
    let err = f
        .engine
        .verify_payment(order_id, "pay_1", "forged")
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Gateway(_)));
    let order = f.engine.get_order(order_id).await.unwrap().order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Failed);

    let signature = InMemoryGateway::signature_for(&init.gateway_order_id, "pay_1");
    let settled = f
        .engine
        .verify_payment(order_id, "pay_1", &signature)
        .await
        .unwrap();
    assert_eq!(settled.status, OrderStatus::Received);
    assert_eq!(settled.payment_status, PaymentStatus::Paid);
    assert_eq!(settled.payment_id.as_deref(), Some("pay_1"));

    // A replayed callback is a no-op.
    let replay = f
        .engine
        .verify_payment(order_id, "pay_1", &signature)
        .await
        .unwrap();
    assert_eq!(replay.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn cancellation_restocks_both_levels() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p = varied_product(f.seller_id, "500g", 5, 10);
    f.store.insert_product(&p).await.unwrap();

    let mut l = line(p.id, 2);
    l.variant = Some(VariationSelector::ByLabel("500g".to_string()));
    let receipt = f
        .engine
        .place_order(request(f.customer_id, vec![l]))
        .await
        .unwrap();

    let during = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(during.stock, 8);
    assert_eq!(during.variations[0].stock, 3);

    let cancelled = f
        .engine
        .cancel_order(CancelOrder {
            order_id: receipt.order.id,
            reason: "changed my mind".to_string(),
            cancelled_by: f.customer_id.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    let audit = cancelled.cancellation.expect("audit recorded");
    assert_eq!(audit.reason, "changed my mind");

    let after = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 10);
    assert_eq!(after.variations[0].stock, 5);

    let item = f.store.get_order_item(receipt.items[0].id).await.unwrap().unwrap();
    assert_eq!(item.status, ItemStatus::Cancelled);

    // A second cancellation is rejected.
    let err = f
        .engine
        .cancel_order(CancelOrder {
            order_id: receipt.order.id,
            reason: "again".to_string(),
            cancelled_by: f.customer_id.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(_)));
}

#[tokio::test]
async fn shipped_orders_cannot_be_cancelled() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p = plain_product(f.seller_id, 100, 5);
    f.store.insert_product(&p).await.unwrap();

    let receipt = f
        .engine
        .place_order(request(f.customer_id, vec![line(p.id, 1)]))
        .await
        .unwrap();

    let mut order = receipt.order.clone();
    order.status = OrderStatus::Shipped;
    f.store.update_order(None, &order).await.unwrap();

    let err = f
        .engine
        .cancel_order(CancelOrder {
            order_id: order.id,
            reason: "too late".to_string(),
            cancelled_by: f.customer_id.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(_)));

    let after = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 4);
}

#[tokio::test]
async fn out_of_area_addresses_are_rejected_before_reserving() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;

    // A second seller far outside its 10 km radius from the address.
    let chennai_seller = SellerId::new();
    f.store
        .insert_seller(&Seller {
            id: chennai_seller,
            store_name: "Marina Mart".to_string(),
            status: SellerStatus::Active,
            location: Some(GeoPoint::new(13.0827, 80.2707)),
            service_radius_km: 10.0,
        })
        .await
        .unwrap();
    let p = plain_product(chennai_seller, 100, 5);
    f.store.insert_product(&p).await.unwrap();

    let err = f
        .engine
        .place_order(request(f.customer_id, vec![line(p.id, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::ServiceArea(_)));

    let after = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 5);
}

#[tokio::test]
async fn free_gift_needs_the_threshold_subtotal() {
    let config = DiscountConfig {
        online_payment_discount_pct: 0.0,
        free_gift_threshold: Money::from_major(200),
    };
    let f = setup(InMemoryStore::new(), config).await;
    let p = plain_product(f.seller_id, 100, 10);
    let mut gift = plain_product(f.seller_id, 50, 10);
    gift.name = "Sample Jar".to_string();
    f.store.insert_product(&p).await.unwrap();
    f.store.insert_product(&gift).await.unwrap();

    let mut gift_line = line(gift.id, 1);
    gift_line.free_gift = true;

    // Paid subtotal 100 is under the 200 threshold.
    let err = f
        .engine
        .place_order(request(
            f.customer_id,
            vec![line(p.id, 1), gift_line.clone()],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(_)));
    let after = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 10);

    // Paid subtotal 200 qualifies; the gift line costs nothing.
    let receipt = f
        .engine
        .place_order(request(f.customer_id, vec![line(p.id, 2), gift_line]))
        .await
        .unwrap();
    assert_eq!(receipt.order.subtotal, Money::from_major(200));
    assert_eq!(receipt.order.total, Money::from_major(200));
    let gift_item = receipt
        .items
        .iter()
        .find(|i| i.product_id == gift.id)
        .unwrap();
    assert!(gift_item.unit_price.is_zero());

    // The failed attempt's gift reservation was rolled back, so only the
    // successful placement consumed a jar.
    let gift_after = f.store.get_product(gift.id).await.unwrap().unwrap();
    assert_eq!(gift_after.stock, 9);
}

#[tokio::test]
async fn return_flow_allows_one_live_request_per_item() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p = plain_product(f.seller_id, 100, 5);
    f.store.insert_product(&p).await.unwrap();

    let receipt = f
        .engine
        .place_order(request(f.customer_id, vec![line(p.id, 2)]))
        .await
        .unwrap();
    let mut order = receipt.order.clone();
    order.status = OrderStatus::Delivered;
    f.store.update_order(None, &order).await.unwrap();

    let base = ReturnOrReplaceRequest {
        order_id: order.id,
        order_item_id: receipt.items[0].id,
        customer_id: f.customer_id,
        request_type: RequestType::Return,
        reason: "wrong flavour".to_string(),
        quantity: 1,
        images: vec![],
    };

    // The order is delivered, so the return is accepted even though the
    // item rows were never individually advanced.
    let filed = f.engine.request_return(base.clone()).await.unwrap();
    assert_eq!(filed.status, domain::ReturnStatus::Pending);

    // The pending request claims the item.
    let err = f.engine.request_return(base.clone()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::DuplicateRequest));
}

#[tokio::test]
async fn return_flow_guards() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p = plain_product(f.seller_id, 100, 5);
    f.store.insert_product(&p).await.unwrap();

    let receipt = f
        .engine
        .place_order(request(f.customer_id, vec![line(p.id, 2)]))
        .await
        .unwrap();
    let item = receipt.items[0].clone();

    let base = ReturnOrReplaceRequest {
        order_id: receipt.order.id,
        order_item_id: item.id,
        customer_id: f.customer_id,
        request_type: RequestType::Return,
        reason: "damaged".to_string(),
        quantity: 1,
        images: vec![],
    };

    // Order not delivered yet.
    let err = f.engine.request_return(base.clone()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(_)));

    let mut delivered = receipt.order.clone();
    delivered.status = OrderStatus::Delivered;
    f.store.update_order(None, &delivered).await.unwrap();

    // A cancelled item cannot come back through the return flow.
    let mut cancelled_item = item.clone();
    cancelled_item.status = ItemStatus::Cancelled;
    f.store.update_order_item(None, &cancelled_item).await.unwrap();
    assert!(f.engine.request_return(base.clone()).await.is_err());
    f.store.update_order_item(None, &item).await.unwrap();

    // Quantity beyond the ordered amount.
    let mut too_many = base.clone();
    too_many.quantity = 3;
    assert!(f.engine.request_return(too_many).await.is_err());

    // Someone else's order.
    let mut stranger = base.clone();
    stranger.customer_id = CustomerId::new();
    assert!(f.engine.request_return(stranger).await.is_err());

    // A replacement without evidence photos.
    let mut replacement = base.clone();
    replacement.request_type = RequestType::Replacement;
    assert!(f.engine.request_return(replacement.clone()).await.is_err());
    replacement.images.push("https://cdn.example/crack.jpg".to_string());
    assert!(f.engine.request_return(replacement).await.is_ok());
}

#[tokio::test]
async fn short_selected_variation_never_substitutes_another() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p = Product {
        id: ProductId::new(),
        seller_id: f.seller_id,
        name: "Mountain Tea".to_string(),
        price: Money::from_major(80),
        disc_price: None,
        stock: 6,
        variations: vec![
            Variation {
                id: VariationId::new(),
                value: Some("250g".to_string()),
                title: None,
                pack: None,
                stock: 5,
                price: Money::from_major(60),
                disc_price: None,
            },
            Variation {
                id: VariationId::new(),
                value: Some("500g".to_string()),
                title: None,
                pack: None,
                stock: 1,
                price: Money::from_major(120),
                disc_price: None,
            },
        ],
    };
    f.store.insert_product(&p).await.unwrap();

    let mut l = line(p.id, 2);
    l.variant = Some(VariationSelector::ByLabel("500g".to_string()));
    let err = f
        .engine
        .place_order(request(f.customer_id, vec![l]))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

    // The first slot was left alone; the customer never picked it.
    let after = f.store.get_product(p.id).await.unwrap().unwrap();
    assert_eq!(after.stock, 6);
    assert_eq!(after.variations[0].stock, 5);
    assert_eq!(after.variations[1].stock, 1);
}

#[tokio::test]
async fn placement_broadcasts_to_each_seller() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let second_seller = SellerId::new();
    f.store
        .insert_seller(&Seller {
            id: second_seller,
            store_name: "Hill Dairy".to_string(),
            status: SellerStatus::Active,
            location: Some(BENGALURU),
            service_radius_km: 10.0,
        })
        .await
        .unwrap();

    let p1 = plain_product(f.seller_id, 100, 5);
    let mut p2 = plain_product(second_seller, 100, 5);
    p2.name = "Ghee".to_string();
    f.store.insert_product(&p1).await.unwrap();
    f.store.insert_product(&p2).await.unwrap();

    let receipt = f
        .engine
        .place_order(request(f.customer_id, vec![line(p1.id, 1), line(p2.id, 1)]))
        .await
        .unwrap();

    // Dispatch is fire-and-forget, so give the spawned tasks a moment.
    let mut notified: Vec<SellerId> = Vec::new();
    for _ in 0..100 {
        notified = f
            .dispatcher
            .sent()
            .into_iter()
            .filter_map(|n| match n {
                Notification::SellerNewOrder { order_id, seller_id }
                    if order_id == receipt.order.id =>
                {
                    Some(seller_id)
                }
                _ => None,
            })
            .collect();
        if notified.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert!(notified.contains(&f.seller_id));
    assert!(notified.contains(&second_seller));
}

#[tokio::test]
async fn unknown_customer_is_rejected() {
    let f = setup(InMemoryStore::new(), DiscountConfig::default()).await;
    let p = plain_product(f.seller_id, 100, 5);
    f.store.insert_product(&p).await.unwrap();

    let err = f
        .engine
        .place_order(request(CustomerId::new(), vec![line(p.id, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::NotFound { kind: "customer", .. }));
}
