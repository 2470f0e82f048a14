use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::itinerary::clock;

use super::RequiredFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CostType {
    PerPerson,
    Total,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttractionVisit {
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub rating: Option<f32>,
    pub cost: Option<f64>,
    pub ticket_count: Option<u32>,
    pub cost_type: Option<CostType>,
}

impl AttractionVisit {
    pub fn scheduled_time(&self) -> Option<String> {
        self.time.as_deref().and_then(clock::normalize_time)
    }
}

impl RequiredFields for AttractionVisit {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        missing
    }
}
