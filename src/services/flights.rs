use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::AppError,
    itinerary::clock,
    models::{flight::TerminalInfo, FlightSegment, TravelTime},
};

/// Scheduled flight data by flight number and departure date.
#[async_trait]
pub trait FlightSchedule: Send + Sync {
    async fn lookup(
        &self,
        flight_number: &str,
        date: NaiveDate,
    ) -> Result<Option<FlightSegment>, AppError>;
}

/// Client for an AeroDataBox-style `/flights/number/{number}/{date}` API.
#[derive(Clone)]
pub struct FlightScheduleClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduledFlight {
    #[serde(default)]
    number: String,
    airline: Option<NamedEntity>,
    departure: Option<FlightEnd>,
    arrival: Option<FlightEnd>,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlightEnd {
    airport: Option<Airport>,
    scheduled_time: Option<LocalTime>,
    scheduled_time_local: Option<String>,
    terminal: Option<String>,
    gate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Airport {
    iata: Option<String>,
    icao: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalTime {
    local: Option<String>,
}

impl FlightEnd {
    fn airport_code(&self) -> String {
        self.airport
            .as_ref()
            .and_then(|a| a.iata.clone().or_else(|| a.icao.clone()))
            .unwrap_or_default()
    }

    fn raw_local(&self) -> Option<&str> {
        self.scheduled_time
            .as_ref()
            .and_then(|t| t.local.as_deref())
            .or(self.scheduled_time_local.as_deref())
    }

    /// Normalised `YYYY-MM-DDTHH:MM` wall-clock time.
    fn local_time(&self) -> String {
        self.raw_local()
            .and_then(clock::parse_local)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M").to_string())
            .unwrap_or_default()
    }

    /// The scheduled instant, when the payload carries a UTC offset.
    fn instant(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.raw_local()?.trim().replace('T', " ");
        DateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M%:z").ok()
    }

    fn terminal_info(&self) -> TerminalInfo {
        TerminalInfo {
            terminal: self.terminal.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl ScheduledFlight {
    fn into_segment(self) -> FlightSegment {
        let departure = self.departure.as_ref();
        let arrival = self.arrival.as_ref();
        let departure_date_time = departure.map(FlightEnd::local_time).unwrap_or_default();
        let arrival_date_time = arrival.map(FlightEnd::local_time).unwrap_or_default();
        let duration = match (
            departure.and_then(FlightEnd::instant),
            arrival.and_then(FlightEnd::instant),
        ) {
            (Some(from), Some(to)) if to >= from => {
                let seconds = (to - from).num_seconds().unsigned_abs();
                Some(TravelTime::from_seconds(seconds).to_string())
            }
            _ => None,
        };
        FlightSegment {
            airline: self.airline.map(|a| a.name).unwrap_or_default(),
            flight_number: self.number.replace(' ', ""),
            departure_airport: departure.map(FlightEnd::airport_code).unwrap_or_default(),
            arrival_airport: arrival.map(FlightEnd::airport_code).unwrap_or_default(),
            departure_date_time,
            arrival_date_time,
            duration,
            departure: departure.map(FlightEnd::terminal_info).unwrap_or_default(),
            arrival: arrival.map(FlightEnd::terminal_info).unwrap_or_default(),
            booking_reference: None,
            cost: None,
        }
    }
}

impl FlightScheduleClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("flight client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl FlightSchedule for FlightScheduleClient {
    async fn lookup(
        &self,
        flight_number: &str,
        date: NaiveDate,
    ) -> Result<Option<FlightSegment>, AppError> {
        let number: String = flight_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::Validation(format!(
                "invalid flight number {flight_number:?}"
            )));
        }
        let url = format!(
            "{}/{number}/{}",
            self.base_url.trim_end_matches('/'),
            date.format("%Y-%m-%d")
        );
        debug!("flight lookup {url}");

        let mut request = self.http.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("X-RapidAPI-Key", key);
        }
        let response = request
            .send()
            .await
            .map_err(|err| AppError::Upstream(format!("flight request failed: {err}")))?;
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(AppError::UpstreamRateLimited),
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => return Ok(None),
            _ => {}
        }
        let flights: Vec<ScheduledFlight> = response
            .error_for_status()
            .map_err(|err| AppError::Upstream(format!("flight http error: {err}")))?
            .json()
            .await
            .map_err(|err| AppError::Upstream(format!("flight json parse failed: {err}")))?;

        Ok(flights.into_iter().next().map(ScheduledFlight::into_segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_schedule_payload_to_segment() {
        let raw = r#"[{
            "number": "TP 1351",
            "airline": {"name": "TAP Air Portugal"},
            "departure": {
                "airport": {"iata": "LIS", "icao": "LPPT"},
                "scheduledTime": {"local": "2025-06-01 08:00+01:00"},
                "terminal": "1"
            },
            "arrival": {
                "airport": {"icao": "LEMD"},
                "scheduledTimeLocal": "2025-06-01 10:15+02:00",
                "gate": "B12"
            }
        }]"#;
        let flights: Vec<ScheduledFlight> = serde_json::from_str(raw).unwrap();
        let segment = flights.into_iter().next().unwrap().into_segment();

        assert_eq!(segment.flight_number, "TP1351");
        assert_eq!(segment.airline, "TAP Air Portugal");
        assert_eq!(segment.departure_airport, "LIS");
        assert_eq!(segment.arrival_airport, "LEMD");
        assert_eq!(segment.departure_date_time, "2025-06-01T08:00");
        assert_eq!(segment.arrival_date_time, "2025-06-01T10:15");
        assert_eq!(segment.duration.as_deref(), Some("1 hour 15 mins"));
        assert_eq!(segment.departure.terminal.as_deref(), Some("1"));
        assert_eq!(segment.arrival.gate.as_deref(), Some("B12"));
    }
}
