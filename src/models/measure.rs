//! Numeric distance and travel-time values.
//!
//! Both serialize as an object carrying the raw number plus a derived `text`
//! for display. On input they accept the number alone, that object, or an
//! already formatted string such as `"12.3 km"` or `"1 hour 5 mins"`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const METERS_PER_MILE: f64 = 1609.344;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Distance {
    pub meters: u64,
}

impl Distance {
    pub fn from_meters(meters: u64) -> Self {
        Self { meters }
    }

    /// Parses strings like `"12.3 km"`, `"850 m"` or `"4.1 mi"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (value, unit) = split_number(raw.trim())?;
        let meters = match unit.trim().to_ascii_lowercase().as_str() {
            "km" | "kms" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                value * 1000.0
            }
            "m" | "meter" | "meters" | "metre" | "metres" | "" => value,
            "mi" | "mile" | "miles" => value * METERS_PER_MILE,
            _ => return None,
        };
        Some(Self::from_meters(meters.round() as u64))
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.meters < 1000 {
            write!(f, "{} m", self.meters)
        } else {
            let tenths = self.meters.saturating_add(50) / 100;
            write!(f, "{}.{} km", tenths / 10, tenths % 10)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TravelTime {
    pub seconds: u64,
}

impl TravelTime {
    pub fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self::from_seconds(minutes.saturating_mul(60))
    }

    /// Whole minutes, rounded up so a 61 second drive counts as 2 minutes.
    pub fn minutes(&self) -> u64 {
        self.seconds.div_ceil(60)
    }

    /// `None` when the value does not fit a chrono duration.
    pub fn as_chrono(&self) -> Option<chrono::Duration> {
        i64::try_from(self.seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }

    /// Parses strings like `"25 mins"`, `"1 hour 5 mins"` or `"2 hrs"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut rest = raw.trim();
        let mut seconds = 0.0;
        let mut matched = false;
        while !rest.is_empty() {
            let (value, tail) = split_number(rest)?;
            let tail = tail.trim_start();
            let unit_len = tail
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(tail.len());
            let unit = tail[..unit_len].to_ascii_lowercase();
            seconds += match unit.as_str() {
                "d" | "day" | "days" => value * 86_400.0,
                "h" | "hr" | "hrs" | "hour" | "hours" => value * 3600.0,
                "m" | "min" | "mins" | "minute" | "minutes" => value * 60.0,
                "s" | "sec" | "secs" | "second" | "seconds" => value,
                _ => return None,
            };
            matched = true;
            rest = tail[unit_len..].trim_start();
        }
        matched.then(|| Self::from_seconds(seconds.round() as u64))
    }
}

impl std::ops::Add for TravelTime {
    type Output = TravelTime;

    fn add(self, rhs: Self) -> Self::Output {
        TravelTime::from_seconds(self.seconds.saturating_add(rhs.seconds))
    }
}

impl fmt::Display for TravelTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.minutes();
        let hours = total / 60;
        let minutes = total % 60;
        let unit = |n: u64, one: &str, many: &str| {
            if n == 1 {
                format!("{n} {one}")
            } else {
                format!("{n} {many}")
            }
        };
        match (hours, minutes) {
            (0, m) => write!(f, "{}", unit(m, "min", "mins")),
            (h, 0) => write!(f, "{}", unit(h, "hour", "hours")),
            (h, m) => write!(f, "{} {}", unit(h, "hour", "hours"), unit(m, "min", "mins")),
        }
    }
}

fn split_number(raw: &str) -> Option<(f64, &str)> {
    let end = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(raw.len());
    if end == 0 {
        return None;
    }
    let value = raw[..end].replace(',', "").parse::<f64>().ok()?;
    Some((value, &raw[end..]))
}

#[derive(Serialize)]
struct DistanceWire<'a> {
    meters: u64,
    text: &'a str,
}

impl Serialize for Distance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.to_string();
        DistanceWire {
            meters: self.meters,
            text: &text,
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DistanceInput {
    Meters(u64),
    Object { meters: u64 },
    Text(String),
}

impl<'de> Deserialize<'de> for Distance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match DistanceInput::deserialize(deserializer)? {
            DistanceInput::Meters(meters) | DistanceInput::Object { meters } => {
                Ok(Distance::from_meters(meters))
            }
            DistanceInput::Text(text) => Distance::parse(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("unrecognised distance {text:?}"))),
        }
    }
}

#[derive(Serialize)]
struct TravelTimeWire<'a> {
    seconds: u64,
    text: &'a str,
}

impl Serialize for TravelTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.to_string();
        TravelTimeWire {
            seconds: self.seconds,
            text: &text,
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TravelTimeInput {
    Seconds(u64),
    Object { seconds: u64 },
    Text(String),
}

impl<'de> Deserialize<'de> for TravelTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TravelTimeInput::deserialize(deserializer)? {
            TravelTimeInput::Seconds(seconds) | TravelTimeInput::Object { seconds } => {
                Ok(TravelTime::from_seconds(seconds))
            }
            TravelTimeInput::Text(text) => TravelTime::parse(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("unrecognised duration {text:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formatted_distances() {
        assert_eq!(Distance::parse("12.3 km"), Some(Distance::from_meters(12_300)));
        assert_eq!(Distance::parse("850 m"), Some(Distance::from_meters(850)));
        assert_eq!(Distance::parse("1 mi"), Some(Distance::from_meters(1609)));
        assert_eq!(Distance::parse("far"), None);
    }

    #[test]
    fn parses_formatted_durations() {
        assert_eq!(TravelTime::parse("25 mins"), Some(TravelTime::from_minutes(25)));
        assert_eq!(
            TravelTime::parse("1 hour 5 mins"),
            Some(TravelTime::from_minutes(65))
        );
        assert_eq!(TravelTime::parse("2 hrs"), Some(TravelTime::from_minutes(120)));
        assert_eq!(TravelTime::parse("soon"), None);
    }

    #[test]
    fn display_derives_text_from_numbers() {
        assert_eq!(Distance::from_meters(640).to_string(), "640 m");
        assert_eq!(Distance::from_meters(18_250).to_string(), "18.3 km");
        assert_eq!(Distance::from_meters(18_249).to_string(), "18.2 km");
        assert_eq!(Distance::from_meters(1_000).to_string(), "1.0 km");
        assert_eq!(Distance::from_meters(999_960).to_string(), "1000.0 km");
        assert_eq!(TravelTime::from_minutes(1).to_string(), "1 min");
        assert_eq!(TravelTime::from_minutes(65).to_string(), "1 hour 5 mins");
        assert_eq!(TravelTime::from_minutes(120).to_string(), "2 hours");
    }

    #[test]
    fn durations_add_up() {
        let total = TravelTime::from_minutes(20) + TravelTime::from_minutes(45);
        assert_eq!(total.minutes(), 65);

        let capped = TravelTime::from_seconds(u64::MAX) + TravelTime::from_minutes(1);
        assert_eq!(capped.seconds, u64::MAX);
    }

    #[test]
    fn oversized_durations_have_no_chrono_form() {
        assert_eq!(
            TravelTime::from_minutes(90).as_chrono(),
            Some(chrono::Duration::minutes(90))
        );
        assert_eq!(TravelTime::from_seconds(u64::MAX).as_chrono(), None);
        assert_eq!(TravelTime::from_seconds(10_000_000_000_000_000).as_chrono(), None);
    }

    #[test]
    fn accepts_all_input_shapes() {
        let a: Distance = serde_json::from_str("1500").unwrap();
        let b: Distance = serde_json::from_str(r#"{"meters":1500,"text":"1.5 km"}"#).unwrap();
        let c: Distance = serde_json::from_str(r#""1.5 km""#).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);

        let json = serde_json::to_value(TravelTime::from_minutes(30)).unwrap();
        assert_eq!(json["seconds"], 1800);
        assert_eq!(json["text"], "30 mins");
    }
}
