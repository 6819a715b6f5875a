//! HTTP API server for the marketplace order engine.
//!
//! Exposes the checkout flows as REST endpoints, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{CheckoutEngine, InMemoryDispatcher, InMemoryGateway};
use domain::DiscountConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use store::MarketStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::place))
        .route("/orders/online", post(routes::orders::place_online))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/verify", post(routes::orders::verify))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route(
            "/orders/{id}/items/{item_id}/return",
            post(routes::orders::file_return),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given store, wired to the in-memory
/// gateway and dispatcher. The fakes are returned so tests (and local runs)
/// can steer them.
pub fn create_default_state(
    store: Arc<dyn MarketStore>,
    discounts: DiscountConfig,
) -> (Arc<AppState>, InMemoryGateway, InMemoryDispatcher) {
    let gateway = InMemoryGateway::new();
    let dispatcher = InMemoryDispatcher::new();

    let engine = CheckoutEngine::new(
        store,
        Arc::new(gateway.clone()),
        Arc::new(dispatcher.clone()),
        discounts,
    );

    (Arc::new(AppState { engine }), gateway, dispatcher)
}
