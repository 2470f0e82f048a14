use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use chrono::NaiveTime;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripStoreKind {
    File,
    Memory,
}

/// Tunables for the derived itinerary events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Flights departing before this time of day are treated as late-night flights.
    pub late_night_threshold: NaiveTime,
    pub default_checkin: NaiveTime,
    pub default_checkout: NaiveTime,
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).expect("constant time is valid")
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            late_night_threshold: hour(6),
            default_checkin: hour(15),
            default_checkout: hour(12),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub trip_store: TripStoreKind,
    pub data_root: PathBuf,
    pub distance_api_url: String,
    pub distance_api_key: Option<String>,
    pub flight_api_url: String,
    pub flight_api_key: Option<String>,
    pub upstream_timeout: Duration,
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tripboard.db?mode=rwc".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let trip_store = match env::var("TRIP_STORE").as_deref() {
            Ok("memory") => TripStoreKind::Memory,
            Ok("file") | Err(_) => TripStoreKind::File,
            Ok(other) => {
                return Err(AppError::Config(format!(
                    "invalid TRIP_STORE {other:?} (expected \"file\" or \"memory\")"
                )))
            }
        };

        let data_root = env::var("DATA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let distance_api_url = env::var("DISTANCE_API_URL").unwrap_or_else(|_| {
            "https://maps.googleapis.com/maps/api/distancematrix/json".to_string()
        });
        let distance_api_key = env::var("DISTANCE_API_KEY").ok();

        let flight_api_url = env::var("FLIGHT_API_URL")
            .unwrap_or_else(|_| "https://aerodatabox.p.rapidapi.com/flights/number".to_string());
        let flight_api_key = env::var("FLIGHT_API_KEY").ok();

        let upstream_timeout = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|err| {
                AppError::Config(format!("invalid UPSTREAM_TIMEOUT_SECS: {err}"))
            })?),
            Err(_) => Duration::from_secs(15),
        };

        let defaults = ScheduleConfig::default();
        let schedule = ScheduleConfig {
            late_night_threshold: time_var("LATE_NIGHT_THRESHOLD", defaults.late_night_threshold)?,
            default_checkin: time_var("DEFAULT_CHECKIN_TIME", defaults.default_checkin)?,
            default_checkout: time_var("DEFAULT_CHECKOUT_TIME", defaults.default_checkout)?,
        };

        Ok(Self {
            database_url,
            listen_addr,
            trip_store,
            data_root,
            distance_api_url,
            distance_api_key,
            flight_api_url,
            flight_api_key,
            upstream_timeout,
            schedule,
        })
    }
}

fn time_var(name: &str, default: NaiveTime) -> Result<NaiveTime, AppError> {
    match env::var(name) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map_err(|err| AppError::Config(format!("invalid {name} {raw:?}: {err}"))),
        Err(_) => Ok(default),
    }
}
