//! Order placement, payment, cancellation and return endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{
    CancelOrder, CheckoutEngine, OrderReceipt, PlaceOrderRequest, ReturnOrReplaceRequest,
};
use common::{CustomerId, OrderId, OrderItemId};
use domain::{Order, OrderItem, PaymentMethod, RequestType, ReturnRequest};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub engine: CheckoutEngine,
}

// -- Request types --

#[derive(Deserialize)]
pub struct VerifyPaymentRequest {
    pub payment_id: String,
    pub signature: String,
}

#[derive(Deserialize)]
pub struct CancelOrderRequest {
    pub reason: String,
    #[serde(default)]
    pub cancelled_by: Option<String>,
}

#[derive(Deserialize)]
pub struct ReturnRequestBody {
    pub customer_id: CustomerId,
    pub request_type: RequestType,
    pub reason: String,
    pub quantity: u32,
    #[serde(default)]
    pub images: Vec<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: &'static str,
    pub subtotal_cents: i64,
    pub platform_fee_cents: i64,
    pub delivery_fee_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub gateway_order_id: Option<String>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub variation: Option<String>,
    pub status: String,
}

#[derive(Serialize)]
pub struct PaymentInitResponse {
    pub order: OrderResponse,
    pub gateway_order_id: String,
    pub amount_cents: i64,
}

#[derive(Serialize)]
pub struct ReturnResponse {
    pub id: String,
    pub order_id: String,
    pub order_item_id: String,
    pub request_type: String,
    pub status: String,
    pub quantity: u32,
}

impl OrderResponse {
    fn from_parts(order: Order, items: Vec<OrderItem>) -> Self {
        let items = items
            .into_iter()
            .map(|item| OrderItemResponse {
                id: item.id.to_string(),
                product_id: item.product_id.to_string(),
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
                total_cents: item.total.cents(),
                variation: item.variation,
                status: item.status.to_string(),
            })
            .collect();

        Self {
            id: order.id.to_string(),
            order_number: order.order_number,
            status: order.status.to_string(),
            payment_status: order.payment_status.to_string(),
            payment_method: match order.payment_method {
                PaymentMethod::Cash => "cash",
                PaymentMethod::Online => "online",
            },
            subtotal_cents: order.subtotal.cents(),
            platform_fee_cents: order.platform_fee.cents(),
            delivery_fee_cents: order.shipping.cents(),
            discount_cents: order.discount.cents(),
            total_cents: order.total.cents(),
            gateway_order_id: order.gateway_order_id,
            items,
        }
    }
}

impl From<OrderReceipt> for OrderResponse {
    fn from(receipt: OrderReceipt) -> Self {
        Self::from_parts(receipt.order, receipt.items)
    }
}

impl From<ReturnRequest> for ReturnResponse {
    fn from(r: ReturnRequest) -> Self {
        Self {
            id: r.id.to_string(),
            order_id: r.order_id.to_string(),
            order_item_id: r.order_item_id.to_string(),
            request_type: r.request_type.to_string(),
            status: r.status.to_string(),
            quantity: r.quantity,
        }
    }
}

// -- Handlers --

/// POST /orders — place a cash-on-delivery order.
#[tracing::instrument(skip(state, req))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let receipt = state.engine.place_order(req).await?;
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// POST /orders/online — place a pending order and open a payment session.
#[tracing::instrument(skip(state, req))]
pub async fn place_online(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PaymentInitResponse>), ApiError> {
    let init = state.engine.initiate_online_payment(req).await?;
    let order_id = init.order.id;
    let receipt = state.engine.get_order(order_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentInitResponse {
            order: receipt.into(),
            gateway_order_id: init.gateway_order_id,
            amount_cents: init.amount.cents(),
        }),
    ))
}

/// POST /orders/{id}/verify — settle an online payment from the gateway callback.
#[tracing::instrument(skip(state, req))]
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .engine
        .verify_payment(order_id, &req.payment_id, &req.signature)
        .await?;
    let items = state.engine.get_order(order.id).await?.items;
    Ok(Json(OrderResponse::from_parts(order, items)))
}

/// POST /orders/{id}/cancel — cancel an order and restock its items.
#[tracing::instrument(skip(state, req))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .engine
        .cancel_order(CancelOrder {
            order_id,
            reason: req.reason,
            cancelled_by: req.cancelled_by.unwrap_or_else(|| "customer".to_string()),
        })
        .await?;
    let items = state.engine.get_order(order.id).await?.items;
    Ok(Json(OrderResponse::from_parts(order, items)))
}

/// POST /orders/{id}/items/{item_id}/return — file a return or replacement.
#[tracing::instrument(skip(state, req))]
pub async fn file_return(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<ReturnRequestBody>,
) -> Result<(StatusCode, Json<ReturnResponse>), ApiError> {
    let order_id = parse_order_id(&id)?;
    let order_item_id = parse_item_id(&item_id)?;

    let record = state
        .engine
        .request_return(ReturnOrReplaceRequest {
            order_id,
            order_item_id,
            customer_id: req.customer_id,
            request_type: req.request_type,
            reason: req.reason,
            quantity: req.quantity,
            images: req.images,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /orders/{id} — load an order with its line items.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let receipt = state.engine.get_order(order_id).await?;
    Ok(Json(receipt.into()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn parse_item_id(id: &str) -> Result<OrderItemId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid item id: {e}")))?;
    Ok(OrderItemId::from_uuid(uuid))
}
