//! Service-area validation: every seller on an order must be able to reach
//! the customer.

use common::GeoPoint;

use crate::error::DomainError;
use crate::participants::Seller;

/// Checks that each seller delivers to the customer's coordinates.
///
/// All sellers must pass; the first failure aborts with an error naming the
/// offending seller and the measured distance. A seller without a location
/// on record fails outright.
pub fn check_service_area(customer: &GeoPoint, sellers: &[Seller]) -> Result<(), DomainError> {
    for seller in sellers {
        let Some(location) = seller.location else {
            return Err(DomainError::SellerLocationMissing {
                store_name: seller.store_name.clone(),
            });
        };
        let distance_km = customer.distance_km(&location);
        if distance_km > seller.service_radius_km {
            return Err(DomainError::OutOfServiceArea {
                store_name: seller.store_name.clone(),
                distance_km,
                radius_km: seller.service_radius_km,
            });
        }
    }
    Ok(())
}
