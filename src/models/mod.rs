pub mod attraction;
pub mod checklist;
pub mod flight;
pub mod hotel;
pub mod measure;
pub mod ride;
pub mod trip;
pub mod user;

use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::AppError;

pub use attraction::AttractionVisit;
pub use checklist::{Checklist, ChecklistCategory, ChecklistItem, UserChecklist};
pub use flight::FlightSegment;
pub use hotel::HotelBooking;
pub use measure::{Distance, TravelTime};
pub use ride::{RideKind, RideLeg};
pub use trip::{NewTrip, SharedUser, Trip, TripPatch};

/// Minimal field set a sub-resource needs before it may be stored.
pub trait RequiredFields {
    fn missing_fields(&self) -> Vec<&'static str>;

    fn validate(&self) -> Result<(), AppError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing_fields_error(&missing))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubResourceKind {
    Flights,
    Hotels,
    Rides,
    Attractions,
}

impl SubResourceKind {
    pub const ALL: [SubResourceKind; 4] = [
        SubResourceKind::Flights,
        SubResourceKind::Hotels,
        SubResourceKind::Rides,
        SubResourceKind::Attractions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubResourceKind::Flights => "flights",
            SubResourceKind::Hotels => "hotels",
            SubResourceKind::Rides => "rides",
            SubResourceKind::Attractions => "attractions",
        }
    }
}

impl fmt::Display for SubResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubResourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("unknown sub-resource kind {s:?}")))
    }
}

/// Any of the four record shapes a trip holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubResource {
    Flight(FlightSegment),
    Hotel(HotelBooking),
    Ride(RideLeg),
    Attraction(AttractionVisit),
}

impl SubResource {
    /// Decodes a JSON body as the record shape of `kind` and validates it.
    pub fn from_json(kind: SubResourceKind, body: Value) -> Result<Self, AppError> {
        let item = match kind {
            SubResourceKind::Flights => SubResource::Flight(decode(kind, body)?),
            SubResourceKind::Hotels => SubResource::Hotel(decode(kind, body)?),
            SubResourceKind::Rides => SubResource::Ride(decode(kind, body)?),
            SubResourceKind::Attractions => SubResource::Attraction(decode(kind, body)?),
        };
        item.validate()?;
        Ok(item)
    }

    pub fn kind(&self) -> SubResourceKind {
        match self {
            SubResource::Flight(_) => SubResourceKind::Flights,
            SubResource::Hotel(_) => SubResourceKind::Hotels,
            SubResource::Ride(_) => SubResourceKind::Rides,
            SubResource::Attraction(_) => SubResourceKind::Attractions,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            SubResource::Flight(flight) => flight.validate(),
            SubResource::Hotel(hotel) => hotel.validate(),
            SubResource::Ride(ride) => ride.validate(),
            SubResource::Attraction(attraction) => attraction.validate(),
        }
    }
}

pub(crate) fn missing_fields_error(missing: &[&str]) -> AppError {
    AppError::Validation(format!("missing required field(s): {}", missing.join(", ")))
}

fn decode<T: DeserializeOwned>(kind: SubResourceKind, body: Value) -> Result<T, AppError> {
    serde_json::from_value(body)
        .map_err(|err| AppError::Validation(format!("invalid {kind}: {err}")))
}

/// Treats an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
