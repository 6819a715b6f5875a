//! Unit of work over the store's optional transaction support.
//!
//! Placement opens a transaction when the backend offers one; when it does
//! not, the flow runs in degraded best-effort mode and failure recovery
//! becomes explicit compensation, mirroring the writes in reverse.

use common::{OrderId, OrderItemId};
use store::{MarketStore, StoreError, TxId};

use crate::error::Result;
use crate::reservation::StockClaim;

/// Everything an aborted best-effort placement has to undo.
#[derive(Debug, Default)]
pub(crate) struct Compensation {
    claims: Vec<StockClaim>,
    order_id: Option<OrderId>,
    item_ids: Vec<OrderItemId>,
}

impl Compensation {
    pub(crate) fn record_claim(&mut self, claim: StockClaim) {
        self.claims.push(claim);
    }

    pub(crate) fn record_order(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
    }

    pub(crate) fn record_item(&mut self, item_id: OrderItemId) {
        self.item_ids.push(item_id);
    }
}

/// One placement's atomicity scope.
pub(crate) enum UnitOfWork {
    /// Backed by a real store transaction.
    Transactional(TxId),
    /// No transaction available; writes land immediately.
    BestEffort,
}

impl UnitOfWork {
    /// Probes the store for transaction support.
    pub(crate) async fn begin(store: &dyn MarketStore) -> Result<Self> {
        match store.begin_transaction().await {
            Ok(tx) => Ok(UnitOfWork::Transactional(tx)),
            Err(StoreError::TransactionUnsupported) => {
                tracing::warn!("store transactions unavailable, continuing best-effort");
                metrics::counter!("checkout_degraded_total").increment(1);
                Ok(UnitOfWork::BestEffort)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The transaction to thread through store calls, if any.
    pub(crate) fn tx(&self) -> Option<TxId> {
        match self {
            UnitOfWork::Transactional(tx) => Some(*tx),
            UnitOfWork::BestEffort => None,
        }
    }

    /// Makes the unit's writes durable.
    pub(crate) async fn commit(self, store: &dyn MarketStore) -> Result<()> {
        match self {
            UnitOfWork::Transactional(tx) => Ok(store.commit(tx).await?),
            UnitOfWork::BestEffort => Ok(()),
        }
    }

    /// Discards the unit's writes.
    ///
    /// Transactional units roll back. Best-effort units replay the recorded
    /// compensation in reverse write order; individual compensation failures
    /// are logged and skipped so the rest still runs.
    pub(crate) async fn abort(self, store: &dyn MarketStore, compensation: Compensation) {
        match self {
            UnitOfWork::Transactional(tx) => {
                if let Err(e) = store.rollback(tx).await {
                    tracing::error!(error = %e, "transaction rollback failed");
                }
            }
            UnitOfWork::BestEffort => {
                for item_id in compensation.item_ids.iter().rev() {
                    if let Err(e) = store.delete_order_item(None, *item_id).await {
                        tracing::error!(error = %e, %item_id, "compensation: item delete failed");
                    }
                }
                if let Some(order_id) = compensation.order_id {
                    if let Err(e) = store.delete_order(None, order_id).await {
                        tracing::error!(error = %e, %order_id, "compensation: order delete failed");
                    }
                }
                for claim in compensation.claims.iter().rev() {
                    if let Err(e) = claim.release(store, None).await {
                        tracing::error!(error = %e, "compensation: restock failed");
                    }
                }
            }
        }
    }
}
