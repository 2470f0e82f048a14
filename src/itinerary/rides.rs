//! Draft ground-transport legs between two itinerary anchor points.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::AppError,
    models::{Distance, RideKind, RideLeg, TravelTime, Trip},
    services::distance::DistanceService,
};

/// A location tied to a trip record, or a raw address.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    Airport(String),
    Hotel(usize),
    Attraction(usize),
    Address { label: String, address: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAnchor {
    pub label: String,
    pub address: String,
    pub place_id: Option<String>,
}

impl ResolvedAnchor {
    pub fn address(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            label: address.clone(),
            address,
            place_id: None,
        }
    }
}

impl Anchor {
    /// Airports use their code as the address; hotels and attractions use
    /// their stored address.
    pub fn resolve(&self, trip: &Trip) -> Result<ResolvedAnchor, AppError> {
        let resolved = match self {
            Anchor::Airport(code) => {
                let code = code.trim().to_uppercase();
                ResolvedAnchor {
                    label: code.clone(),
                    address: code,
                    place_id: None,
                }
            }
            Anchor::Hotel(index) => {
                let hotel = trip.hotels.get(*index).ok_or_else(|| {
                    AppError::Validation(format!("trip has no hotel at index {index}"))
                })?;
                ResolvedAnchor {
                    label: hotel.name.clone(),
                    address: hotel.address.clone(),
                    place_id: hotel.place_id.clone(),
                }
            }
            Anchor::Attraction(index) => {
                let attraction = trip.attractions.get(*index).ok_or_else(|| {
                    AppError::Validation(format!("trip has no attraction at index {index}"))
                })?;
                ResolvedAnchor {
                    label: attraction.name.clone(),
                    address: attraction.address.clone(),
                    place_id: attraction.place_id.clone(),
                }
            }
            Anchor::Address { label, address } => ResolvedAnchor {
                label: label.clone(),
                address: address.clone(),
                place_id: None,
            },
        };
        if resolved.address.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "{} has no address to route from",
                resolved.label
            )));
        }
        Ok(resolved)
    }
}

/// An unsaved ride between two anchors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideDraft {
    pub pickup: String,
    pub dropoff: String,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_place_id: Option<String>,
    pub dropoff_place_id: Option<String>,
    pub distance: Distance,
    pub duration: TravelTime,
}

impl RideDraft {
    pub fn into_ride(self, date: Option<NaiveDate>, time: Option<String>) -> RideLeg {
        RideLeg {
            kind: RideKind::Taxi,
            pickup: self.pickup,
            dropoff: self.dropoff,
            pickup_place_id: self.pickup_place_id,
            dropoff_place_id: self.dropoff_place_id,
            pickup_address: Some(self.pickup_address),
            dropoff_address: Some(self.dropoff_address),
            distance: Some(self.distance),
            duration: Some(self.duration),
            date,
            time,
            ..Default::default()
        }
    }
}

/// Asks the distance service for a route. Nothing is stored; a missing
/// route surfaces as `RouteUnavailable` with the upstream status.
pub async fn generate(
    distance: &dyn DistanceService,
    from: &ResolvedAnchor,
    to: &ResolvedAnchor,
) -> Result<RideDraft, AppError> {
    let route = distance.route(&from.address, &to.address).await?;
    info!(
        "drafted ride {:?} -> {:?}: {}, {}",
        from.label, to.label, route.distance, route.duration
    );
    Ok(RideDraft {
        pickup: from.label.clone(),
        dropoff: to.label.clone(),
        pickup_address: from.address.clone(),
        dropoff_address: to.address.clone(),
        pickup_place_id: from.place_id.clone(),
        dropoff_place_id: to.place_id.clone(),
        distance: route.distance,
        duration: route.duration,
    })
}
