use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RequiredFields;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HotelBooking {
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub nights: Option<u32>,
    pub cost: Option<f64>,
    pub rating: Option<f32>,
    pub meal_plan: Option<String>,
    pub room_type: Option<String>,
    pub confirmation_number: Option<String>,
}

impl HotelBooking {
    /// Whether the guest sleeps at this hotel on the night starting at `date`.
    pub fn covers_night(&self, date: NaiveDate) -> bool {
        matches!(
            (self.check_in, self.check_out),
            (Some(start), Some(end)) if start <= date && date < end
        )
    }
}

impl RequiredFields for HotelBooking {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.check_in.is_none() {
            missing.push("checkIn");
        }
        if self.check_out.is_none() {
            missing.push("checkOut");
        }
        missing
    }
}
