//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Money;

use crate::error::{CheckoutError, Result};

/// A payment session opened at the gateway for one order.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    /// The order id assigned by the gateway, echoed back at verification.
    pub gateway_order_id: String,
    pub amount: Money,
}

/// Trait for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a payment session for the given amount.
    async fn create_order(&self, amount: Money, receipt: &str) -> Result<GatewaySession>;

    /// Checks a callback signature against the session it claims to settle.
    async fn verify_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    sessions: HashMap<String, Money>,
    next_id: u32,
    fail_on_create: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail on the next create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Returns the number of open sessions.
    pub fn session_count(&self) -> usize {
        self.state.read().unwrap().sessions.len()
    }

    /// Computes the signature the gateway expects for a settlement callback.
    pub fn signature_for(gateway_order_id: &str, payment_id: &str) -> String {
        format!("sig:{gateway_order_id}:{payment_id}")
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_order(&self, amount: Money, _receipt: &str) -> Result<GatewaySession> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(CheckoutError::Gateway(
                "gateway rejected order creation".to_string(),
            ));
        }

        state.next_id += 1;
        let gateway_order_id = format!("GW-{:04}", state.next_id);
        state.sessions.insert(gateway_order_id.clone(), amount);

        Ok(GatewaySession {
            gateway_order_id,
            amount,
        })
    }

    async fn verify_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool> {
        let state = self.state.read().unwrap();
        if !state.sessions.contains_key(gateway_order_id) {
            return Ok(false);
        }
        Ok(signature == Self::signature_for(gateway_order_id, payment_id))
    }
}
