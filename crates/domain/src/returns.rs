//! Return and replacement requests.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, OrderItemId, ReturnId};
use serde::{Deserialize, Serialize};

/// What the customer is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Return,
    Replacement,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestType::Return => "Return",
            RequestType::Replacement => "Replacement",
        };
        write!(f, "{s}")
    }
}

/// Admin-driven lifecycle of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReturnStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Processing,
    PickedUp,
    Completed,
}

impl ReturnStatus {
    /// Returns true if this request blocks a new one on the same item.
    ///
    /// Only a rejection frees the item for another attempt; everything else,
    /// including Completed, keeps the item claimed.
    pub fn blocks_new_request(&self) -> bool {
        !matches!(self, ReturnStatus::Rejected)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "Pending",
            ReturnStatus::Approved => "Approved",
            ReturnStatus::Rejected => "Rejected",
            ReturnStatus::Processing => "Processing",
            ReturnStatus::PickedUp => "Picked Up",
            ReturnStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer request to return or replace a delivered line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: ReturnId,
    pub order_id: OrderId,
    pub order_item_id: OrderItemId,
    pub customer_id: CustomerId,
    pub request_type: RequestType,
    pub reason: String,
    pub status: ReturnStatus,
    pub quantity: u32,
    /// Evidence photos; mandatory for replacements.
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}
