pub mod planning;
pub mod sharing;
pub mod trips;

use axum::{extract::FromRequest, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{auth::CurrentUser, error::AppError, models::Trip, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(trips::router())
        .merge(sharing::router())
        .merge(planning::router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// `axum::Json` whose rejections use the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Loads a trip the caller may read. Identity is checked before existence.
pub(crate) async fn visible_trip(
    state: &AppState,
    current: &CurrentUser,
    id: &str,
) -> Result<Trip, AppError> {
    current.require_user()?;
    let trip = state.trips.get(id).await?;
    current.require_viewer(&trip)?;
    Ok(trip)
}

/// Loads a trip the caller may change.
pub(crate) async fn owned_trip(
    state: &AppState,
    current: &CurrentUser,
    id: &str,
) -> Result<Trip, AppError> {
    current.require_user()?;
    let trip = state.trips.get(id).await?;
    current.require_owner(&trip)?;
    Ok(trip)
}

/// Parses a positional path segment. Negative values are kept so the
/// aggregate reports them as out of range.
pub(crate) fn parse_index(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid index {raw:?}")))
}
