use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    auth::CurrentUser,
    error::AppError,
    itinerary::{
        self,
        checkout::{self, Departure, HotelStop},
        clock,
        rides::{self, ResolvedAnchor},
        Anchor, CheckoutAdvisory, Itinerary, RideDraft,
    },
    models::{missing_fields_error, FlightSegment, RequiredFields, RideLeg},
    state::AppState,
};

use super::{parse_index, visible_trip, ApiJson};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips/:id/itinerary", get(trip_itinerary))
        .route("/trips/:id/checkout/:index", get(hotel_checkout))
        .route("/trips/:id/draft-ride", post(draft_trip_ride))
        .route("/smart-checkout", post(smart_checkout))
        .route("/routes", post(draft_route))
        .route("/flights/lookup", get(lookup_flight))
}

/// The checkout time to show for one hotel. Without an advisory the static
/// default applies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutView {
    date: Option<NaiveDate>,
    checkout_time: Option<String>,
    advisory: Option<CheckoutAdvisory>,
}

impl CheckoutView {
    fn new(
        state: &AppState,
        date: Option<NaiveDate>,
        advisory: Option<CheckoutAdvisory>,
    ) -> Self {
        let checkout_time = match &advisory {
            Some(advisory) => advisory.checkout_time.clone(),
            None => Some(clock::format_time(state.config.schedule.default_checkout)),
        };
        Self {
            date: advisory.as_ref().map(|a| a.date).or(date),
            checkout_time,
            advisory,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SmartCheckoutRequest {
    #[serde(default)]
    hotel_address: String,
    #[serde(default)]
    hotel_name: String,
    #[serde(default)]
    airport: String,
    #[serde(default)]
    departure_date_time: String,
    flight_number: Option<String>,
    /// Trip whose rides are checked for an existing airport transfer.
    trip_id: Option<String>,
}

impl RequiredFields for SmartCheckoutRequest {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.hotel_address.trim().is_empty() {
            missing.push("hotelAddress");
        }
        if self.airport.trim().is_empty() {
            missing.push("airport");
        }
        if clock::parse_local(&self.departure_date_time).is_none() {
            missing.push("departureDateTime");
        }
        missing
    }
}

#[derive(Debug, Deserialize)]
struct RouteRequest {
    #[serde(default)]
    origin: String,
    #[serde(default)]
    destination: String,
}

impl RequiredFields for RouteRequest {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.origin.trim().is_empty() {
            missing.push("origin");
        }
        if self.destination.trim().is_empty() {
            missing.push("destination");
        }
        missing
    }
}

#[derive(Debug, Deserialize)]
struct DraftRideRequest {
    from: Anchor,
    to: Anchor,
    date: Option<NaiveDate>,
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlightLookupQuery {
    #[serde(default)]
    number: String,
    #[serde(default)]
    date: String,
}

impl FlightLookupQuery {
    fn date(&self) -> Option<NaiveDate> {
        self.date.trim().parse().ok()
    }
}

impl RequiredFields for FlightLookupQuery {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.number.trim().is_empty() {
            missing.push("number");
        }
        if self.date().is_none() {
            missing.push("date");
        }
        missing
    }
}

async fn trip_itinerary(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Itinerary>, AppError> {
    let trip = visible_trip(&state, &current, &id).await?;
    let schedule = state.config.schedule;
    let advisories = checkout::advise_for_trip(state.distance.as_ref(), &trip, &schedule).await;
    debug!(
        "itinerary for trip {id} with {} checkout advisory(ies)",
        advisories.len()
    );
    Ok(Json(itinerary::build(&trip, &advisories, &schedule)))
}

async fn hotel_checkout(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, index)): Path<(String, String)>,
) -> Result<Json<CheckoutView>, AppError> {
    let trip = visible_trip(&state, &current, &id).await?;
    let raw_index = parse_index(&index)?;
    let hotel = usize::try_from(raw_index)
        .ok()
        .and_then(|index| trip.hotels.get(index).map(|hotel| (index, hotel)));
    let Some((index, hotel)) = hotel else {
        return Err(AppError::IndexOutOfRange {
            kind: "hotels",
            index: raw_index,
            len: trip.hotels.len(),
        });
    };
    let advisory = checkout::advise_for_hotel(
        state.distance.as_ref(),
        &trip,
        index,
        &state.config.schedule,
    )
    .await;
    Ok(Json(CheckoutView::new(&state, hotel.check_out, advisory)))
}

async fn smart_checkout(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(request): ApiJson<SmartCheckoutRequest>,
) -> Result<Json<CheckoutView>, AppError> {
    current.require_user()?;
    request.validate()?;
    let Some(at) = clock::parse_local(&request.departure_date_time) else {
        return Err(missing_fields_error(&["departureDateTime"]));
    };

    let rides: Vec<RideLeg> = match &request.trip_id {
        Some(trip_id) => visible_trip(&state, &current, trip_id).await?.rides,
        None => Vec::new(),
    };
    let hotel = HotelStop {
        index: None,
        name: request.hotel_name.trim().to_string(),
        address: request.hotel_address.trim().to_string(),
        place_id: None,
    };
    let departure = Departure {
        flight_number: request
            .flight_number
            .map(|number| number.trim().to_string())
            .filter(|number| !number.is_empty()),
        airport: request.airport.trim().to_uppercase(),
        at,
    };
    let advisory = checkout::advise(
        state.distance.as_ref(),
        &hotel,
        &departure,
        &rides,
        &state.config.schedule,
    )
    .await;
    Ok(Json(CheckoutView::new(&state, Some(at.date()), advisory)))
}

async fn draft_route(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(request): ApiJson<RouteRequest>,
) -> Result<Json<RideDraft>, AppError> {
    current.require_user()?;
    request.validate()?;
    let from = ResolvedAnchor::address(request.origin.trim());
    let to = ResolvedAnchor::address(request.destination.trim());
    let draft = rides::generate(state.distance.as_ref(), &from, &to).await?;
    Ok(Json(draft))
}

async fn draft_trip_ride(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<DraftRideRequest>,
) -> Result<Json<RideLeg>, AppError> {
    let trip = visible_trip(&state, &current, &id).await?;
    let from = request.from.resolve(&trip)?;
    let to = request.to.resolve(&trip)?;
    let time = match request.time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            clock::parse_time(raw)
                .map(clock::format_time)
                .ok_or_else(|| AppError::Validation(format!("invalid time {raw:?}")))?,
        ),
    };
    let draft = rides::generate(state.distance.as_ref(), &from, &to).await?;
    Ok(Json(draft.into_ride(request.date, time)))
}

async fn lookup_flight(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<FlightLookupQuery>,
) -> Result<Json<FlightSegment>, AppError> {
    current.require_user()?;
    query.validate()?;
    let Some(date) = query.date() else {
        return Err(missing_fields_error(&["date"]));
    };
    state
        .flights
        .lookup(query.number.trim(), date)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}
