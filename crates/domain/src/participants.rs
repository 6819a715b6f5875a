//! Sellers and customers.

use common::{CustomerId, GeoPoint, SellerId};
use serde::{Deserialize, Serialize};

/// Radius a seller delivers within when none is configured.
pub const DEFAULT_SERVICE_RADIUS_KM: f64 = 10.0;

/// Whether a seller is currently accepting orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SellerStatus {
    #[default]
    Active,
    Suspended,
}

/// A vendor on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub id: SellerId,
    pub store_name: String,
    pub status: SellerStatus,
    /// Store coordinates; a seller without a location fails the service check.
    pub location: Option<GeoPoint>,
    #[serde(default = "default_radius")]
    pub service_radius_km: f64,
}

fn default_radius() -> f64 {
    DEFAULT_SERVICE_RADIUS_KM
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
}
