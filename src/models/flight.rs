use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::itinerary::clock;

use super::RequiredFields;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TerminalInfo {
    pub terminal: Option<String>,
    pub gate: Option<String>,
}

/// One flight leg. Date-times are local wall-clock strings as printed on the
/// booking; departure after arrival is tolerated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightSegment {
    #[serde(default)]
    pub airline: String,
    #[serde(default)]
    pub flight_number: String,
    #[serde(default)]
    pub departure_airport: String,
    #[serde(default)]
    pub arrival_airport: String,
    #[serde(default)]
    pub departure_date_time: String,
    #[serde(default)]
    pub arrival_date_time: String,
    pub duration: Option<String>,
    #[serde(default)]
    pub departure: TerminalInfo,
    #[serde(default)]
    pub arrival: TerminalInfo,
    pub booking_reference: Option<String>,
    pub cost: Option<f64>,
}

impl FlightSegment {
    pub fn departure_date(&self) -> Option<NaiveDate> {
        clock::date_part(&self.departure_date_time)
    }

    pub fn departure_time(&self) -> Option<String> {
        clock::time_of(&self.departure_date_time)
    }

    pub fn arrival_time(&self) -> Option<String> {
        clock::time_of(&self.arrival_date_time)
    }

    pub fn label(&self) -> String {
        let route = format!("{} → {}", self.departure_airport, self.arrival_airport);
        match self.airline.trim() {
            "" => format!("{} {route}", self.flight_number),
            airline => format!("{airline} {} {route}", self.flight_number),
        }
    }
}

impl RequiredFields for FlightSegment {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.flight_number.trim().is_empty() {
            missing.push("flightNumber");
        }
        if clock::parse_local(&self.departure_date_time).is_none() {
            missing.push("departureDateTime");
        }
        if clock::parse_local(&self.arrival_date_time).is_none() {
            missing.push("arrivalDateTime");
        }
        missing
    }
}
