use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{
    error::AppError,
    models::{Distance, TravelTime},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEstimate {
    pub distance: Distance,
    pub duration: TravelTime,
}

/// Driving distance and time between two free-form addresses (airport codes
/// are accepted as addresses).
#[async_trait]
pub trait DistanceService: Send + Sync {
    async fn route(&self, origin: &str, destination: &str) -> Result<RouteEstimate, AppError>;
}

/// Client for a Distance-Matrix style JSON API.
#[derive(Clone)]
pub struct DistanceMatrixClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: u64,
}

impl DistanceMatrixClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("distance client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }

    fn request_url(&self, origin: &str, destination: &str) -> Result<Url, AppError> {
        let mut params = vec![
            ("origins", origin),
            ("destinations", destination),
            ("mode", "driving"),
            ("units", "metric"),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }
        Url::parse_with_params(&self.base_url, params)
            .map_err(|err| AppError::Config(format!("invalid DISTANCE_API_URL: {err}")))
    }
}

#[async_trait]
impl DistanceService for DistanceMatrixClient {
    async fn route(&self, origin: &str, destination: &str) -> Result<RouteEstimate, AppError> {
        let url = self.request_url(origin, destination)?;
        debug!("distance lookup {origin:?} -> {destination:?}");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| AppError::Upstream(format!("distance request failed: {err}")))?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::UpstreamRateLimited);
        }
        let body: MatrixResponse = response
            .error_for_status()
            .map_err(|err| AppError::Upstream(format!("distance http error: {err}")))?
            .json()
            .await
            .map_err(|err| AppError::Upstream(format!("distance json parse failed: {err}")))?;

        estimate_from(body)
    }
}

fn estimate_from(body: MatrixResponse) -> Result<RouteEstimate, AppError> {
    match body.status.as_str() {
        "OK" => {}
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => return Err(AppError::UpstreamRateLimited),
        other => {
            return Err(AppError::RouteUnavailable {
                status: other.to_string(),
            })
        }
    }

    let element = body
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(|| AppError::RouteUnavailable {
            status: "ZERO_RESULTS".to_string(),
        })?;
    if element.status != "OK" {
        return Err(AppError::RouteUnavailable {
            status: element.status,
        });
    }
    match (element.distance, element.duration) {
        (Some(distance), Some(duration)) => Ok(RouteEstimate {
            distance: Distance::from_meters(distance.value),
            duration: TravelTime::from_seconds(duration.value),
        }),
        _ => Err(AppError::RouteUnavailable {
            status: "INCOMPLETE_RESULT".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<RouteEstimate, AppError> {
        estimate_from(serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn reads_first_element() {
        let estimate = parse(
            r#"{"status":"OK","rows":[{"elements":[{"status":"OK",
                "distance":{"text":"18.3 km","value":18250},
                "duration":{"text":"24 mins","value":1440}}]}]}"#,
        )
        .unwrap();
        assert_eq!(estimate.distance.meters, 18_250);
        assert_eq!(estimate.duration.minutes(), 24);
    }

    #[test]
    fn element_status_becomes_route_unavailable() {
        let err = parse(r#"{"status":"OK","rows":[{"elements":[{"status":"ZERO_RESULTS"}]}]}"#)
            .unwrap_err();
        match err {
            AppError::RouteUnavailable { status } => assert_eq!(status, "ZERO_RESULTS"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn request_level_failures_are_classified() {
        assert!(matches!(
            parse(r#"{"status":"OVER_QUERY_LIMIT","rows":[]}"#),
            Err(AppError::UpstreamRateLimited)
        ));
        assert!(matches!(
            parse(r#"{"status":"INVALID_REQUEST","rows":[]}"#),
            Err(AppError::RouteUnavailable { .. })
        ));
    }

    #[test]
    fn request_url_carries_endpoints_and_key() {
        let client = DistanceMatrixClient::new(
            "https://maps.example.test/distancematrix/json",
            Some("secret".into()),
            Duration::from_secs(1),
        )
        .unwrap();
        let url = client.request_url("Via Nazionale 7, Rome", "FCO").unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("origins".into(), "Via Nazionale 7, Rome".into())));
        assert!(query.contains(&("destinations".into(), "FCO".into())));
        assert!(query.contains(&("key".into(), "secret".into())));
    }
}
