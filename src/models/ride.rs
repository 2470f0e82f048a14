use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::itinerary::clock;

use super::{
    measure::{Distance, TravelTime},
    RequiredFields,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideKind {
    #[default]
    Taxi,
    Rental,
}

/// A ground transport leg. Taxi legs use `date` + `time`; rental legs use
/// the `pickupAt` / `returnAt` date-times instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RideLeg {
    #[serde(rename = "type", default)]
    pub kind: RideKind,
    #[serde(default)]
    pub pickup: String,
    #[serde(default)]
    pub dropoff: String,
    pub pickup_place_id: Option<String>,
    pub dropoff_place_id: Option<String>,
    pub pickup_address: Option<String>,
    pub dropoff_address: Option<String>,
    pub distance: Option<Distance>,
    pub duration: Option<TravelTime>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub pickup_at: Option<String>,
    pub return_at: Option<String>,
    pub cost: Option<f64>,
    pub notes: Option<String>,
}

impl RideLeg {
    /// The explicit date, else the date part of the rental pickup.
    pub fn scheduled_date(&self) -> Option<NaiveDate> {
        self.date
            .or_else(|| self.pickup_at.as_deref().and_then(clock::date_part))
    }

    pub fn scheduled_time(&self) -> Option<String> {
        match self.kind {
            RideKind::Rental => self
                .pickup_at
                .as_deref()
                .and_then(clock::time_of)
                .or_else(|| self.time.as_deref().and_then(clock::normalize_time)),
            RideKind::Taxi => self.time.as_deref().and_then(clock::normalize_time),
        }
    }

    pub fn pickup_text(&self) -> String {
        [Some(self.pickup.as_str()), self.pickup_address.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn dropoff_text(&self) -> String {
        [Some(self.dropoff.as_str()), self.dropoff_address.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl RequiredFields for RideLeg {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.pickup.trim().is_empty() {
            missing.push("pickup");
        }
        if self.dropoff.trim().is_empty() {
            missing.push("dropoff");
        }
        missing
    }
}
