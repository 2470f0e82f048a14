use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

use super::{
    missing_fields_error, null_as_default, AttractionVisit, Checklist, FlightSegment,
    HotelBooking, RequiredFields, RideLeg, SubResource, SubResourceKind, UserChecklist,
};

/// Longest trip, in days, that the itinerary will lay out.
pub const MAX_TRIP_DAYS: i64 = 366;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharedUser {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub shared_at: DateTime<Utc>,
}

/// The stored trip document. Sub-resource collections keep insertion order;
/// chronological views are computed by the itinerary engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destinations: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flights: Vec<FlightSegment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hotels: Vec<HotelBooking>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rides: Vec<RideLeg>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attractions: Vec<AttractionVisit>,
    pub owner_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub checklist: Checklist,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_checklists: BTreeMap<String, UserChecklist>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shared_with: Vec<SharedUser>,
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destinations: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub flights: Option<Vec<FlightSegment>>,
    pub hotels: Option<Vec<HotelBooking>>,
    pub rides: Option<Vec<RideLeg>>,
    pub attractions: Option<Vec<AttractionVisit>>,
    pub checklist: Option<Checklist>,
}

/// Top-level fields to overwrite. Collections are replaced wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    pub name: Option<String>,
    pub destinations: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub flights: Option<Vec<FlightSegment>>,
    pub hotels: Option<Vec<HotelBooking>>,
    pub rides: Option<Vec<RideLeg>>,
    pub attractions: Option<Vec<AttractionVisit>>,
    pub checklist: Option<Checklist>,
}

impl Trip {
    pub fn create(owner_id: impl Into<String>, new: NewTrip) -> Result<Self, AppError> {
        let mut missing = Vec::new();
        if new.name.trim().is_empty() {
            missing.push("name");
        }
        if new.start_date.is_none() {
            missing.push("startDate");
        }
        if new.end_date.is_none() {
            missing.push("endDate");
        }
        let (start_date, end_date) = match (new.start_date, new.end_date) {
            (Some(start), Some(end)) if missing.is_empty() => (start, end),
            _ => return Err(missing_fields_error(&missing)),
        };

        let now = Utc::now();
        let trip = Self {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            destinations: new.destinations,
            start_date,
            end_date,
            flights: new.flights.unwrap_or_default(),
            hotels: new.hotels.unwrap_or_default(),
            rides: new.rides.unwrap_or_default(),
            attractions: new.attractions.unwrap_or_default(),
            owner_id: owner_id.into(),
            checklist: new.checklist.unwrap_or_else(Checklist::standard),
            user_checklists: BTreeMap::new(),
            shared_with: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        trip.validate()?;
        Ok(trip)
    }

    /// Checks the date range and every stored sub-resource.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(missing_fields_error(&["name"]));
        }
        if self.start_date > self.end_date {
            return Err(AppError::Validation(format!(
                "startDate {} is after endDate {}",
                self.start_date, self.end_date
            )));
        }
        let days = (self.end_date - self.start_date).num_days() + 1;
        if days > MAX_TRIP_DAYS {
            return Err(AppError::Validation(format!(
                "trip spans {days} days, at most {MAX_TRIP_DAYS} are allowed"
            )));
        }
        self.flights.iter().try_for_each(RequiredFields::validate)?;
        self.hotels.iter().try_for_each(RequiredFields::validate)?;
        self.rides.iter().try_for_each(RequiredFields::validate)?;
        self.attractions.iter().try_for_each(RequiredFields::validate)?;
        Ok(())
    }

    /// Applies a partial update and re-validates the merged trip.
    pub fn apply(&mut self, patch: TripPatch) -> Result<(), AppError> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(destinations) = patch.destinations {
            next.destinations = destinations;
        }
        if let Some(start_date) = patch.start_date {
            next.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            next.end_date = end_date;
        }
        if let Some(flights) = patch.flights {
            next.flights = flights;
        }
        if let Some(hotels) = patch.hotels {
            next.hotels = hotels;
        }
        if let Some(rides) = patch.rides {
            next.rides = rides;
        }
        if let Some(attractions) = patch.attractions {
            next.attractions = attractions;
        }
        if let Some(checklist) = patch.checklist {
            next.checklist = checklist;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn len_of(&self, kind: SubResourceKind) -> usize {
        match kind {
            SubResourceKind::Flights => self.flights.len(),
            SubResourceKind::Hotels => self.hotels.len(),
            SubResourceKind::Rides => self.rides.len(),
            SubResourceKind::Attractions => self.attractions.len(),
        }
    }

    pub fn push(&mut self, item: SubResource) {
        match item {
            SubResource::Flight(flight) => self.flights.push(flight),
            SubResource::Hotel(hotel) => self.hotels.push(hotel),
            SubResource::Ride(ride) => self.rides.push(ride),
            SubResource::Attraction(attraction) => self.attractions.push(attraction),
        }
    }

    pub fn remove(&mut self, kind: SubResourceKind, index: i64) -> Result<SubResource, AppError> {
        let index = self.checked_index(kind, index)?;
        Ok(match kind {
            SubResourceKind::Flights => SubResource::Flight(self.flights.remove(index)),
            SubResourceKind::Hotels => SubResource::Hotel(self.hotels.remove(index)),
            SubResourceKind::Rides => SubResource::Ride(self.rides.remove(index)),
            SubResourceKind::Attractions => {
                SubResource::Attraction(self.attractions.remove(index))
            }
        })
    }

    /// Overwrites the item at `index` with one of the same kind.
    pub fn replace(&mut self, index: i64, item: SubResource) -> Result<(), AppError> {
        let index = self.checked_index(item.kind(), index)?;
        match item {
            SubResource::Flight(flight) => self.flights[index] = flight,
            SubResource::Hotel(hotel) => self.hotels[index] = hotel,
            SubResource::Ride(ride) => self.rides[index] = ride,
            SubResource::Attraction(attraction) => self.attractions[index] = attraction,
        }
        Ok(())
    }

    fn checked_index(&self, kind: SubResourceKind, index: i64) -> Result<usize, AppError> {
        let len = self.len_of(kind);
        usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .ok_or(AppError::IndexOutOfRange {
                kind: kind.as_str(),
                index,
                len,
            })
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn shared_user(&self, user_id: &str) -> Option<&SharedUser> {
        self.shared_with.iter().find(|s| s.user_id == user_id)
    }

    pub fn can_view(&self, user_id: &str) -> bool {
        self.is_owner(user_id) || self.shared_user(user_id).is_some()
    }

    /// Number of calendar days in the inclusive trip range.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(raw: &str) -> NaiveDate {
        raw.parse().unwrap()
    }

    fn sample() -> Trip {
        Trip::create(
            "owner-1",
            NewTrip {
                name: "Lisbon".into(),
                start_date: Some(date("2025-06-01")),
                end_date: Some(date("2025-06-03")),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn ride(pickup: &str) -> SubResource {
        SubResource::from_json(
            SubResourceKind::Rides,
            json!({ "pickup": pickup, "dropoff": "LIS" }),
        )
        .unwrap()
    }

    #[test]
    fn create_normalizes_missing_collections() {
        let trip = sample();
        assert!(trip.flights.is_empty());
        assert!(trip.hotels.is_empty());
        assert!(trip.rides.is_empty());
        assert!(trip.attractions.is_empty());
        assert!(!trip.checklist.categories().is_empty());

        let value = serde_json::to_value(&trip).unwrap();
        assert_eq!(value["flights"], json!([]));
        assert_eq!(value["attractions"], json!([]));
    }

    #[test]
    fn null_collections_read_back_as_empty() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["rides"] = json!(null);
        value.as_object_mut().unwrap().remove("hotels");
        let trip: Trip = serde_json::from_value(value).unwrap();
        assert!(trip.rides.is_empty());
        assert!(trip.hotels.is_empty());
    }

    #[test]
    fn create_rejects_inverted_range() {
        let err = Trip::create(
            "owner-1",
            NewTrip {
                name: "Backwards".into(),
                start_date: Some(date("2025-06-05")),
                end_date: Some(date("2025-06-01")),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn create_names_every_missing_field() {
        let err = Trip::create("owner-1", NewTrip::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("name"));
        assert!(message.contains("startDate"));
        assert!(message.contains("endDate"));
    }

    #[test]
    fn rejects_trips_longer_than_a_year() {
        let endless = NewTrip {
            name: "Forever".into(),
            start_date: Some(date("0001-01-01")),
            end_date: Some(date("9999-12-31")),
            ..Default::default()
        };
        let err = Trip::create("owner-1", endless).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("366"));

        let mut trip = sample();
        let year = TripPatch {
            end_date: Some(date("2026-06-01")),
            ..Default::default()
        };
        trip.apply(year).unwrap();
        let longer = TripPatch {
            end_date: Some(date("2026-06-02")),
            ..Default::default()
        };
        assert!(trip.apply(longer).is_err());
        assert_eq!(trip.end_date, date("2026-06-01"));
    }

    #[test]
    fn append_then_remove_restores_collection() {
        let mut trip = sample();
        trip.push(ride("Hotel A"));
        let before = trip.rides.clone();
        trip.push(ride("Hotel B"));
        let removed = trip.remove(SubResourceKind::Rides, 1).unwrap();
        assert_eq!(removed.kind(), SubResourceKind::Rides);
        assert_eq!(trip.rides, before);
    }

    #[test]
    fn remove_out_of_range_leaves_trip_untouched() {
        let mut trip = sample();
        trip.push(ride("Hotel A"));
        let before = trip.clone();

        for index in [-1, 1, 7] {
            let err = trip.remove(SubResourceKind::Rides, index).unwrap_err();
            assert!(matches!(err, AppError::IndexOutOfRange { .. }));
        }
        assert_eq!(trip, before);
    }

    #[test]
    fn patch_replaces_collections_wholesale() {
        let mut trip = sample();
        trip.push(ride("Hotel A"));
        trip.push(ride("Hotel B"));
        trip.apply(TripPatch {
            rides: Some(vec![RideLeg {
                pickup: "Airport".into(),
                dropoff: "Old town".into(),
                ..Default::default()
            }]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(trip.rides.len(), 1);
        assert_eq!(trip.rides[0].pickup, "Airport");
        assert_eq!(trip.name, "Lisbon");
    }

    #[test]
    fn rejected_patch_keeps_previous_state() {
        let mut trip = sample();
        let before = trip.clone();
        let err = trip
            .apply(TripPatch {
                end_date: Some(date("2025-05-01")),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(trip, before);
    }
}
