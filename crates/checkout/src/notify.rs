//! Notification dispatch trait and in-memory implementation.
//!
//! Notifications are fire-and-forget: the engine spawns the dispatch and a
//! failure is logged, never surfaced to the customer request.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, ReturnId, SellerId};
use domain::RequestType;

use crate::error::{CheckoutError, Result};

/// An event worth telling the customer or seller about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    OrderPlaced {
        order_id: OrderId,
        order_number: String,
    },
    /// Seller-facing broadcast, sent once per distinct seller on the order.
    SellerNewOrder {
        order_id: OrderId,
        seller_id: SellerId,
    },
    PaymentConfirmed {
        order_id: OrderId,
    },
    OrderCancelled {
        order_id: OrderId,
        reason: String,
    },
    ReturnRequested {
        return_id: ReturnId,
        request_type: RequestType,
    },
}

/// Trait for the outbound notification channel.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Delivers one notification.
    async fn dispatch(&self, notification: Notification) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryDispatcherState {
    sent: Vec<Notification>,
    fail_on_dispatch: bool,
}

/// In-memory dispatcher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDispatcher {
    state: Arc<RwLock<InMemoryDispatcherState>>,
}

impl InMemoryDispatcher {
    /// Creates a new in-memory dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the dispatcher to fail on the next dispatch call.
    pub fn set_fail_on_dispatch(&self, fail: bool) {
        self.state.write().unwrap().fail_on_dispatch = fail;
    }

    /// Returns the number of delivered notifications.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns a snapshot of delivered notifications.
    pub fn sent(&self) -> Vec<Notification> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryDispatcher {
    async fn dispatch(&self, notification: Notification) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_dispatch {
            return Err(CheckoutError::Validation(
                "notification channel unavailable".to_string(),
            ));
        }
        state.sent.push(notification);
        Ok(())
    }
}
