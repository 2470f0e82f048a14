//! Groups a trip's sub-resources into per-day buckets.
//!
//! Every date of the inclusive trip range gets a bucket, empty or not. Items
//! dated outside the range get extra buckets of their own instead of being
//! dropped. Within a bucket, events are ordered by their `HH:MM` time with a
//! stable sort; untimed events come first.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::{
    config::ScheduleConfig,
    models::{RideKind, Trip},
};

use super::{checkout::CheckoutAdvisory, clock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Flight,
    HotelCheckIn,
    HotelCheckOut,
    Ride,
    Attraction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryEvent {
    pub kind: EventKind,
    /// Position of the source record in its trip collection.
    pub index: usize,
    pub time: Option<String>,
    pub title: String,
    pub detail: Option<String>,
    /// True for markers that exist only in this view.
    pub synthesized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub in_range: bool,
    pub events: Vec<ItineraryEvent>,
    /// Hotels whose night starts on this date.
    pub staying: Vec<usize>,
}

impl DayBucket {
    fn new(date: NaiveDate, in_range: bool) -> Self {
        Self {
            date,
            in_range,
            events: Vec::new(),
            staying: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub days: Vec<DayBucket>,
    /// Items without any resolvable date.
    pub unscheduled: Vec<ItineraryEvent>,
}

impl Itinerary {
    pub fn day(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.days.iter().find(|day| day.date == date)
    }
}

/// Builds the day-by-day view. `advisories` override the default checkout
/// time for the hotel and date they were computed for.
pub fn build(
    trip: &Trip,
    advisories: &[CheckoutAdvisory],
    schedule: &ScheduleConfig,
) -> Itinerary {
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    let mut date = trip.start_date;
    while date <= trip.end_date {
        days.insert(date, DayBucket::new(date, true));
        match date.checked_add_days(Days::new(1)) {
            Some(next) => date = next,
            None => break,
        }
    }

    let mut unscheduled = Vec::new();
    let mut place = |date: Option<NaiveDate>, event: ItineraryEvent| match date {
        Some(date) => days
            .entry(date)
            .or_insert_with(|| DayBucket::new(date, false))
            .events
            .push(event),
        None => unscheduled.push(event),
    };

    for (index, flight) in trip.flights.iter().enumerate() {
        let detail = flight
            .arrival_time()
            .map(|arrival| format!("arrives {} at {arrival}", flight.arrival_airport));
        place(
            flight.departure_date(),
            ItineraryEvent {
                kind: EventKind::Flight,
                index,
                time: flight.departure_time(),
                title: flight.label(),
                detail,
                synthesized: false,
            },
        );
    }

    for (index, hotel) in trip.hotels.iter().enumerate() {
        place(
            hotel.check_in,
            ItineraryEvent {
                kind: EventKind::HotelCheckIn,
                index,
                time: Some(clock::format_time(schedule.default_checkin)),
                title: format!("Check in: {}", hotel.name),
                detail: Some(hotel.address.clone()).filter(|a| !a.is_empty()),
                synthesized: true,
            },
        );

        let Some(check_out) = hotel.check_out else {
            continue;
        };
        let advisory = advisories
            .iter()
            .find(|a| a.hotel_index == Some(index) && a.date == check_out);
        let time = advisory
            .and_then(|a| a.checkout_time.clone())
            .unwrap_or_else(|| clock::format_time(schedule.default_checkout));
        place(
            Some(check_out),
            ItineraryEvent {
                kind: EventKind::HotelCheckOut,
                index,
                time: Some(time),
                title: format!("Check out: {}", hotel.name),
                detail: advisory.map(|a| a.message.clone()),
                synthesized: true,
            },
        );
    }

    for (index, ride) in trip.rides.iter().enumerate() {
        let title = match ride.kind {
            RideKind::Taxi => format!("Taxi: {} → {}", ride.pickup, ride.dropoff),
            RideKind::Rental => format!("Rental car: {} → {}", ride.pickup, ride.dropoff),
        };
        let detail = match (ride.distance, ride.duration) {
            (Some(distance), Some(duration)) => Some(format!("{distance}, {duration}")),
            (Some(distance), None) => Some(distance.to_string()),
            (None, Some(duration)) => Some(duration.to_string()),
            (None, None) => None,
        };
        place(
            ride.scheduled_date(),
            ItineraryEvent {
                kind: EventKind::Ride,
                index,
                time: ride.scheduled_time(),
                title,
                detail,
                synthesized: false,
            },
        );
    }

    for (index, attraction) in trip.attractions.iter().enumerate() {
        place(
            attraction.date,
            ItineraryEvent {
                kind: EventKind::Attraction,
                index,
                time: attraction.scheduled_time(),
                title: attraction.name.clone(),
                detail: Some(attraction.address.clone()).filter(|a| !a.is_empty()),
                synthesized: false,
            },
        );
    }

    let days = days
        .into_values()
        .map(|mut day| {
            // Option orders None first, so untimed events lead.
            day.events.sort_by(|a, b| a.time.cmp(&b.time));
            day.staying = trip
                .hotels
                .iter()
                .enumerate()
                .filter(|(_, hotel)| hotel.covers_night(day.date))
                .map(|(index, _)| index)
                .collect();
            day
        })
        .collect();

    Itinerary { days, unscheduled }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{AttractionVisit, FlightSegment, HotelBooking, NewTrip, RideLeg, TravelTime},
        services::distance::RouteEstimate,
    };

    fn date(raw: &str) -> NaiveDate {
        raw.parse().unwrap()
    }

    fn trip(start: &str, end: &str) -> Trip {
        Trip::create(
            "owner",
            NewTrip {
                name: "Test".into(),
                start_date: Some(date(start)),
                end_date: Some(date(end)),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn flight(number: &str, departs: &str, arrives: &str) -> FlightSegment {
        FlightSegment {
            flight_number: number.into(),
            departure_airport: "JFK".into(),
            arrival_airport: "LIS".into(),
            departure_date_time: departs.into(),
            arrival_date_time: arrives.into(),
            ..Default::default()
        }
    }

    fn attraction(name: &str, on: &str, time: Option<&str>) -> AttractionVisit {
        AttractionVisit {
            name: name.into(),
            date: Some(date(on)),
            time: time.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn one_bucket_per_day_even_when_empty() {
        let trip = trip("2025-06-01", "2025-06-10");
        let itinerary = build(&trip, &[], &ScheduleConfig::default());
        assert_eq!(itinerary.days.len() as i64, trip.day_count());
        assert!(itinerary.days.iter().all(|d| d.in_range && d.events.is_empty()));
        for pair in itinerary.days.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }

    #[test]
    fn single_day_trip_has_one_bucket() {
        let trip = trip("2025-06-01", "2025-06-01");
        let itinerary = build(&trip, &[], &ScheduleConfig::default());
        assert_eq!(itinerary.days.len(), 1);
    }

    #[test]
    fn flight_and_hotel_markers_land_on_their_days() {
        let mut trip = trip("2025-06-01", "2025-06-03");
        trip.flights
            .push(flight("TP202", "2025-06-01T08:00", "2025-06-01T10:00"));
        trip.hotels.push(HotelBooking {
            name: "Hotel Avenida".into(),
            address: "Av. da Liberdade 1".into(),
            check_in: Some(date("2025-06-01")),
            check_out: Some(date("2025-06-03")),
            ..Default::default()
        });

        let itinerary = build(&trip, &[], &ScheduleConfig::default());
        assert_eq!(itinerary.days.len(), 3);

        let first = &itinerary.days[0];
        let kinds: Vec<_> = first.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Flight, EventKind::HotelCheckIn]);
        assert_eq!(first.events[1].time.as_deref(), Some("15:00"));
        assert_eq!(first.staying, vec![0]);

        assert!(itinerary.days[1].events.is_empty());
        assert_eq!(itinerary.days[1].staying, vec![0]);

        let last = &itinerary.days[2];
        assert_eq!(last.events.len(), 1);
        assert_eq!(last.events[0].kind, EventKind::HotelCheckOut);
        assert_eq!(last.events[0].time.as_deref(), Some("12:00"));
        assert!(last.staying.is_empty());
    }

    #[test]
    fn events_sort_by_time_with_untimed_first() {
        let mut trip = trip("2025-06-02", "2025-06-02");
        trip.attractions
            .push(attraction("Museum", "2025-06-02", Some("14:30")));
        trip.attractions.push(attraction("Walk", "2025-06-02", None));
        trip.attractions
            .push(attraction("Breakfast", "2025-06-02", Some("9:15")));
        trip.attractions.push(attraction("Market", "2025-06-02", None));
        trip.rides.push(RideLeg {
            pickup: "Hotel".into(),
            dropoff: "Museum".into(),
            date: Some(date("2025-06-02")),
            time: Some("14:00".into()),
            duration: Some(TravelTime::from_minutes(20)),
            ..Default::default()
        });

        let itinerary = build(&trip, &[], &ScheduleConfig::default());
        let titles: Vec<_> = itinerary.days[0]
            .events
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec!["Walk", "Market", "Breakfast", "Taxi: Hotel → Museum", "Museum"]
        );
    }

    #[test]
    fn items_outside_range_get_their_own_bucket() {
        let mut trip = trip("2025-06-02", "2025-06-03");
        trip.attractions
            .push(attraction("Early bird", "2025-05-30", Some("10:00")));
        trip.attractions
            .push(attraction("Late show", "2025-06-05", None));

        let itinerary = build(&trip, &[], &ScheduleConfig::default());
        let dates: Vec<_> = itinerary.days.iter().map(|d| (d.date, d.in_range)).collect();
        assert_eq!(
            dates,
            vec![
                (date("2025-05-30"), false),
                (date("2025-06-02"), true),
                (date("2025-06-03"), true),
                (date("2025-06-05"), false),
            ]
        );
        assert_eq!(itinerary.days[0].events[0].title, "Early bird");
    }

    #[test]
    fn each_item_appears_in_exactly_one_bucket() {
        let mut trip = trip("2025-06-01", "2025-06-04");
        trip.attractions
            .push(attraction("Tower", "2025-06-02", Some("10:00")));
        trip.attractions.push(attraction("Park", "2025-06-04", None));
        trip.flights
            .push(flight("TP1", "2025-06-03T07:00", "2025-06-03T09:00"));

        let itinerary = build(&trip, &[], &ScheduleConfig::default());
        for (index, visit) in trip.attractions.iter().enumerate() {
            let hits: Vec<_> = itinerary
                .days
                .iter()
                .filter(|d| {
                    d.events
                        .iter()
                        .any(|e| e.kind == EventKind::Attraction && e.index == index)
                })
                .collect();
            assert_eq!(hits.len(), 1);
            assert_eq!(Some(hits[0].date), visit.date);
        }
        assert_eq!(
            itinerary.day(date("2025-06-03")).unwrap().events[0].kind,
            EventKind::Flight
        );
    }

    #[test]
    fn rental_rides_use_pickup_date_and_undated_rides_are_unscheduled() {
        let mut trip = trip("2025-06-01", "2025-06-03");
        trip.rides.push(RideLeg {
            kind: RideKind::Rental,
            pickup: "Airport".into(),
            dropoff: "Airport".into(),
            pickup_at: Some("2025-06-02T09:30".into()),
            return_at: Some("2025-06-03T18:00".into()),
            ..Default::default()
        });
        trip.rides.push(RideLeg {
            pickup: "Somewhere".into(),
            dropoff: "Elsewhere".into(),
            ..Default::default()
        });

        let itinerary = build(&trip, &[], &ScheduleConfig::default());
        let day = itinerary.day(date("2025-06-02")).unwrap();
        assert_eq!(day.events[0].time.as_deref(), Some("09:30"));
        assert_eq!(itinerary.unscheduled.len(), 1);
        assert_eq!(itinerary.unscheduled[0].index, 1);
    }

    #[test]
    fn advisory_overrides_checkout_time() {
        let mut trip = trip("2025-06-01", "2025-06-03");
        trip.hotels.push(HotelBooking {
            name: "Hotel".into(),
            check_in: Some(date("2025-06-01")),
            check_out: Some(date("2025-06-03")),
            ..Default::default()
        });
        let advisory = CheckoutAdvisory {
            hotel_index: Some(0),
            date: date("2025-06-03"),
            airport: "LIS".into(),
            flight_number: Some("TP202".into()),
            departure_time: "10:00".into(),
            drive: RouteEstimate::default(),
            checkout_time: Some("09:10".into()),
            late_night_flight: false,
            message: "Check out by 09:10".into(),
            should_create_ride: false,
            suggested_ride: None,
        };

        let itinerary = build(&trip, &[advisory], &ScheduleConfig::default());
        let checkout = &itinerary.days[2].events[0];
        assert_eq!(checkout.time.as_deref(), Some("09:10"));
        assert_eq!(checkout.detail.as_deref(), Some("Check out by 09:10"));
    }
}
