use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::Value;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{NewTrip, SubResource, SubResourceKind, Trip, TripPatch},
    state::AppState,
};

use super::{owned_trip, parse_index, visible_trip, ApiJson};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route(
            "/trips/:id",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route("/trips/:id/:kind", post(append_item))
        .route("/trips/:id/:kind/:index", put(replace_item).delete(remove_item))
}

/// Hides the personal checklists of other viewers.
fn visible_to(mut trip: Trip, viewer_id: &str) -> Trip {
    trip.user_checklists.retain(|user_id, _| user_id == viewer_id);
    trip
}

async fn list_trips(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Trip>>, AppError> {
    let user = current.require_user()?;
    let trips = state
        .trips
        .list_for(&user.uuid)
        .await?
        .into_iter()
        .map(|trip| visible_to(trip, &user.uuid))
        .collect();
    Ok(Json(trips))
}

async fn create_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(new): ApiJson<NewTrip>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let user = current.require_user()?;
    let trip = state.trips.create(&user.uuid, new).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Trip>, AppError> {
    let trip = visible_trip(&state, &current, &id).await?;
    let user = current.require_user()?;
    Ok(Json(visible_to(trip, &user.uuid)))
}

async fn update_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TripPatch>,
) -> Result<Json<Trip>, AppError> {
    let owner = owned_trip(&state, &current, &id).await?.owner_id;
    let trip = state.trips.update(&id, patch).await?;
    Ok(Json(visible_to(trip, &owner)))
}

async fn delete_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    owned_trip(&state, &current, &id).await?;
    if state.trips.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

async fn append_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, kind)): Path<(String, String)>,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let owner = owned_trip(&state, &current, &id).await?.owner_id;
    let kind: SubResourceKind = kind.parse()?;
    let item = SubResource::from_json(kind, body)?;
    let trip = state.trips.append(&id, item).await?;
    Ok((StatusCode::CREATED, Json(visible_to(trip, &owner))))
}

async fn replace_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, kind, index)): Path<(String, String, String)>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Trip>, AppError> {
    let owner = owned_trip(&state, &current, &id).await?.owner_id;
    let kind: SubResourceKind = kind.parse()?;
    let index = parse_index(&index)?;
    let item = SubResource::from_json(kind, body)?;
    let trip = state.trips.replace(&id, index, item).await?;
    Ok(Json(visible_to(trip, &owner)))
}

async fn remove_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, kind, index)): Path<(String, String, String)>,
) -> Result<Json<Trip>, AppError> {
    let owner = owned_trip(&state, &current, &id).await?.owner_id;
    let kind: SubResourceKind = kind.parse()?;
    let index = parse_index(&index)?;
    let trip = state.trips.remove(&id, kind, index).await?;
    Ok(Json(visible_to(trip, &owner)))
}
