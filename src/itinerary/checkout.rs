//! Smart checkout: suggests when to leave a hotel on a day with an outbound
//! flight, based on the drive time to the departure airport.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::ScheduleConfig,
    models::{FlightSegment, HotelBooking, RideKind, RideLeg, Trip},
    services::distance::{DistanceService, RouteEstimate},
};

use super::clock;

/// The hotel end of a checkout advisory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelStop {
    pub index: Option<usize>,
    pub name: String,
    pub address: String,
    pub place_id: Option<String>,
}

impl HotelStop {
    pub fn from_booking(index: usize, hotel: &HotelBooking) -> Self {
        Self {
            index: Some(index),
            name: hotel.name.clone(),
            address: hotel.address.clone(),
            place_id: hotel.place_id.clone(),
        }
    }

    fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.address
        } else {
            &self.name
        }
    }

    /// Whether a ride's pickup refers to this hotel.
    fn is_pickup_of(&self, ride: &RideLeg) -> bool {
        if let (Some(ours), Some(theirs)) = (&self.place_id, &ride.pickup_place_id) {
            if ours == theirs {
                return true;
            }
        }
        let pickup = ride.pickup_text().to_lowercase();
        [self.name.as_str(), self.address.as_str()]
            .iter()
            .map(|candidate| candidate.trim().to_lowercase())
            .any(|candidate| !candidate.is_empty() && pickup.contains(&candidate))
    }
}

/// The flight end of a checkout advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub flight_number: Option<String>,
    pub airport: String,
    pub at: NaiveDateTime,
}

impl Departure {
    pub fn from_flight(flight: &FlightSegment) -> Option<Self> {
        Some(Self {
            flight_number: Some(flight.flight_number.clone()).filter(|n| !n.is_empty()),
            airport: flight.departure_airport.trim().to_string(),
            at: clock::parse_local(&flight.departure_date_time)?,
        })
    }

    fn label(&self) -> String {
        match &self.flight_number {
            Some(number) => format!("flight {number}"),
            None => "flight".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutAdvisory {
    pub hotel_index: Option<usize>,
    pub date: NaiveDate,
    pub airport: String,
    pub flight_number: Option<String>,
    pub departure_time: String,
    pub drive: RouteEstimate,
    /// Absent for late-night flights.
    pub checkout_time: Option<String>,
    pub late_night_flight: bool,
    pub message: String,
    pub should_create_ride: bool,
    /// Ready-to-store taxi leg, present when `should_create_ride` is set.
    pub suggested_ride: Option<RideLeg>,
}

/// The earliest flight departing on `date`, if any.
pub fn departing_flight(flights: &[FlightSegment], date: NaiveDate) -> Option<Departure> {
    flights
        .iter()
        .filter_map(Departure::from_flight)
        .filter(|departure| departure.at.date() == date)
        .min_by_key(|departure| departure.at.time())
}

fn ride_exists(hotel: &HotelStop, airport: &str, date: NaiveDate, rides: &[RideLeg]) -> bool {
    let airport = airport.to_lowercase();
    rides.iter().any(|ride| {
        ride.scheduled_date() == Some(date)
            && hotel.is_pickup_of(ride)
            && ride.dropoff_text().to_lowercase().contains(&airport)
    })
}

/// Turns a drive estimate into an advisory. Flights leaving before the
/// late-night threshold get a warning instead of a time; otherwise the
/// checkout time is the departure minus the drive, no earlier than midnight.
pub fn plan(
    hotel: &HotelStop,
    departure: &Departure,
    drive: &RouteEstimate,
    rides: &[RideLeg],
    schedule: &ScheduleConfig,
) -> CheckoutAdvisory {
    let date = departure.at.date();
    let departure_time = clock::format_time(departure.at.time());
    let mut advisory = CheckoutAdvisory {
        hotel_index: hotel.index,
        date,
        airport: departure.airport.clone(),
        flight_number: departure.flight_number.clone(),
        departure_time: departure_time.clone(),
        drive: drive.clone(),
        checkout_time: None,
        late_night_flight: false,
        message: String::new(),
        should_create_ride: false,
        suggested_ride: None,
    };

    if departure.at.time() < schedule.late_night_threshold {
        advisory.late_night_flight = true;
        advisory.message = format!(
            "Your {} leaves {} at {departure_time}. Treat the night before as checkout and \
             allow {} to reach the airport.",
            departure.label(),
            departure.airport,
            drive.duration
        );
        return advisory;
    }

    let checkout = drive
        .duration
        .as_chrono()
        .and_then(|drive| departure.at.checked_sub_signed(drive))
        .filter(|leave_at| leave_at.date() >= date)
        .map_or(NaiveTime::MIN, |leave_at| leave_at.time());
    let checkout_time = clock::format_time(checkout);
    advisory.message = format!(
        "Check out by {checkout_time} to reach {} ({}, {}) for your {departure_time} {}.",
        departure.airport,
        drive.distance,
        drive.duration,
        departure.label()
    );

    if !ride_exists(hotel, &departure.airport, date, rides) {
        advisory.should_create_ride = true;
        advisory.suggested_ride = Some(RideLeg {
            kind: RideKind::Taxi,
            pickup: hotel.label().to_string(),
            dropoff: departure.airport.clone(),
            pickup_place_id: hotel.place_id.clone(),
            dropoff_place_id: None,
            pickup_address: Some(hotel.address.clone()).filter(|a| !a.is_empty()),
            dropoff_address: Some(departure.airport.clone()),
            distance: Some(drive.distance),
            duration: Some(drive.duration),
            date: Some(date),
            time: Some(checkout_time.clone()),
            notes: Some(format!("Transfer for {}", departure.label())),
            ..Default::default()
        });
    }
    advisory.checkout_time = Some(checkout_time);
    advisory
}

/// Looks up the drive and plans the advisory. Lookup failures are logged and
/// swallowed so callers fall back to the default checkout time.
pub async fn advise(
    distance: &dyn DistanceService,
    hotel: &HotelStop,
    departure: &Departure,
    rides: &[RideLeg],
    schedule: &ScheduleConfig,
) -> Option<CheckoutAdvisory> {
    if hotel.address.trim().is_empty() || departure.airport.is_empty() {
        debug!("skipping smart checkout: hotel address or airport missing");
        return None;
    }
    match distance.route(&hotel.address, &departure.airport).await {
        Ok(drive) => Some(plan(hotel, departure, &drive, rides, schedule)),
        Err(err) => {
            warn!(
                "smart checkout lookup failed for {:?} -> {}: {err}",
                hotel.address, departure.airport
            );
            None
        }
    }
}

/// Advisory for one hotel of a trip, if a flight leaves on its checkout day.
pub async fn advise_for_hotel(
    distance: &dyn DistanceService,
    trip: &Trip,
    index: usize,
    schedule: &ScheduleConfig,
) -> Option<CheckoutAdvisory> {
    let hotel = trip.hotels.get(index)?;
    let departure = departing_flight(&trip.flights, hotel.check_out?)?;
    let stop = HotelStop::from_booking(index, hotel);
    advise(distance, &stop, &departure, &trip.rides, schedule).await
}

pub async fn advise_for_trip(
    distance: &dyn DistanceService,
    trip: &Trip,
    schedule: &ScheduleConfig,
) -> Vec<CheckoutAdvisory> {
    let mut advisories = Vec::new();
    for index in 0..trip.hotels.len() {
        if let Some(advisory) = advise_for_hotel(distance, trip, index, schedule).await {
            advisories.push(advisory);
        }
    }
    advisories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Distance, TravelTime};

    fn at(raw: &str) -> NaiveDateTime {
        clock::parse_local(raw).unwrap()
    }

    fn hotel() -> HotelStop {
        HotelStop {
            index: Some(0),
            name: "Hotel Avenida".into(),
            address: "Av. da Liberdade 1, Lisbon".into(),
            place_id: Some("place-1".into()),
        }
    }

    fn departure(raw: &str) -> Departure {
        Departure {
            flight_number: Some("TP202".into()),
            airport: "LIS".into(),
            at: at(raw),
        }
    }

    fn drive(minutes: u64) -> RouteEstimate {
        RouteEstimate {
            distance: Distance::from_meters(9_000),
            duration: TravelTime::from_minutes(minutes),
        }
    }

    fn flight(number: &str, departs: &str) -> FlightSegment {
        FlightSegment {
            flight_number: number.into(),
            departure_airport: "LIS".into(),
            departure_date_time: departs.into(),
            arrival_date_time: departs.into(),
            ..Default::default()
        }
    }

    #[test]
    fn picks_earliest_flight_of_the_day() {
        let flights = vec![
            flight("LATE", "2025-06-03T18:00"),
            flight("OTHER-DAY", "2025-06-04T06:00"),
            flight("EARLY", "2025-06-03T09:30"),
        ];
        let date: NaiveDate = "2025-06-03".parse().unwrap();
        let picked = departing_flight(&flights, date).unwrap();
        assert_eq!(picked.flight_number.as_deref(), Some("EARLY"));
        assert!(departing_flight(&flights, "2025-06-05".parse().unwrap()).is_none());
    }

    #[test]
    fn subtracts_drive_time_from_departure() {
        let advisory = plan(
            &hotel(),
            &departure("2025-06-03T11:00"),
            &drive(25),
            &[],
            &ScheduleConfig::default(),
        );
        assert!(!advisory.late_night_flight);
        assert_eq!(advisory.checkout_time.as_deref(), Some("10:35"));
        assert!(advisory.should_create_ride);

        let ride = advisory.suggested_ride.unwrap();
        assert_eq!(ride.pickup, "Hotel Avenida");
        assert_eq!(ride.dropoff, "LIS");
        assert_eq!(ride.time.as_deref(), Some("10:35"));
        assert_eq!(ride.date, Some("2025-06-03".parse().unwrap()));
    }

    #[test]
    fn early_flight_is_flagged_late_night_without_a_time() {
        let advisory = plan(
            &hotel(),
            &departure("2025-06-03T03:00"),
            &drive(5),
            &[],
            &ScheduleConfig::default(),
        );
        assert!(advisory.late_night_flight);
        assert!(advisory.checkout_time.is_none());
        assert!(!advisory.should_create_ride);
        assert!(advisory.message.contains("night before"));
    }

    #[test]
    fn threshold_is_configurable() {
        let schedule = ScheduleConfig {
            late_night_threshold: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
            ..ScheduleConfig::default()
        };
        let advisory = plan(&hotel(), &departure("2025-06-03T03:00"), &drive(5), &[], &schedule);
        assert!(!advisory.late_night_flight);
        assert_eq!(advisory.checkout_time.as_deref(), Some("02:55"));
    }

    #[test]
    fn long_drive_clamps_to_start_of_day() {
        let advisory = plan(
            &hotel(),
            &departure("2025-06-03T07:00"),
            &drive(8 * 60),
            &[],
            &ScheduleConfig::default(),
        );
        assert_eq!(advisory.checkout_time.as_deref(), Some("00:00"));
    }

    #[test]
    fn absurd_drive_from_upstream_clamps_instead_of_failing() {
        for seconds in [10_000_000_000_000, u64::MAX] {
            let drive = RouteEstimate {
                distance: Distance::from_meters(9_000),
                duration: TravelTime::from_seconds(seconds),
            };
            let advisory = plan(
                &hotel(),
                &departure("2025-06-03T11:00"),
                &drive,
                &[],
                &ScheduleConfig::default(),
            );
            assert_eq!(advisory.checkout_time.as_deref(), Some("00:00"));
            assert!(advisory.should_create_ride);
        }
    }

    #[test]
    fn existing_transfer_suppresses_ride_suggestion() {
        let rides = vec![RideLeg {
            pickup: "Hotel Avenida".into(),
            dropoff: "Lisbon Airport (LIS)".into(),
            date: Some("2025-06-03".parse().unwrap()),
            ..Default::default()
        }];
        let advisory = plan(
            &hotel(),
            &departure("2025-06-03T11:00"),
            &drive(25),
            &rides,
            &ScheduleConfig::default(),
        );
        assert!(!advisory.should_create_ride);
        assert!(advisory.suggested_ride.is_none());
    }

    #[test]
    fn transfer_on_another_day_does_not_count() {
        let rides = vec![RideLeg {
            pickup: "x".into(),
            pickup_place_id: Some("place-1".into()),
            dropoff: "LIS".into(),
            date: Some("2025-06-02".parse().unwrap()),
            ..Default::default()
        }];
        let advisory = plan(
            &hotel(),
            &departure("2025-06-03T11:00"),
            &drive(25),
            &rides,
            &ScheduleConfig::default(),
        );
        assert!(advisory.should_create_ride);
    }
}
