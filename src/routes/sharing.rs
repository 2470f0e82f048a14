use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{Checklist, RequiredFields, SharedUser, UserChecklist},
    services::sharing::checklist_for,
    state::AppState,
};

use super::{owned_trip, visible_trip, ApiJson};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips/:id/share", get(list_shares).post(share_trip))
        .route("/trips/:id/share/:user_id", delete(revoke_share))
        .route(
            "/trips/:id/checklist",
            get(get_checklist).put(put_checklist),
        )
        .route("/trips/:id/checklist/toggle", post(toggle_item))
        .route("/trips/:id/checklist/items", post(add_item))
}

#[derive(Debug, Deserialize)]
struct ShareRequest {
    #[serde(default)]
    emails: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChecklistItemRequest {
    #[serde(default)]
    category: String,
    #[serde(default)]
    label: String,
}

impl RequiredFields for ChecklistItemRequest {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if self.label.trim().is_empty() {
            missing.push("label");
        }
        missing
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChecklistView {
    /// False while the caller still sees the trip default.
    personal: bool,
    checked: usize,
    total: usize,
    checklist: Checklist,
}

impl ChecklistView {
    fn new(checklist: Checklist, personal: bool) -> Self {
        let (checked, total) = checklist.progress();
        Self {
            personal,
            checked,
            total,
            checklist,
        }
    }
}

impl From<UserChecklist> for ChecklistView {
    fn from(personal: UserChecklist) -> Self {
        Self::new(personal.checklist, true)
    }
}

async fn list_shares(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<SharedUser>>, AppError> {
    let trip = owned_trip(&state, &current, &id).await?;
    Ok(Json(trip.shared_with))
}

async fn share_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ShareRequest>,
) -> Result<Json<Vec<SharedUser>>, AppError> {
    owned_trip(&state, &current, &id).await?;
    let shared = state.sharing.share(&id, &request.emails).await?;
    Ok(Json(shared))
}

async fn revoke_share(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<Vec<SharedUser>>, AppError> {
    owned_trip(&state, &current, &id).await?;
    let shared = state.sharing.revoke(&id, &user_id).await?;
    Ok(Json(shared))
}

async fn get_checklist(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ChecklistView>, AppError> {
    let trip = visible_trip(&state, &current, &id).await?;
    let user = current.require_user()?;
    let personal = trip.user_checklists.contains_key(&user.uuid);
    let checklist = checklist_for(&trip, &user.uuid).clone();
    Ok(Json(ChecklistView::new(checklist, personal)))
}

async fn put_checklist(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(checklist): ApiJson<Checklist>,
) -> Result<Json<ChecklistView>, AppError> {
    visible_trip(&state, &current, &id).await?;
    let user = current.require_user()?;
    let stored = state
        .sharing
        .replace_checklist(&id, &user.uuid, checklist)
        .await?;
    Ok(Json(stored.into()))
}

async fn toggle_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ChecklistItemRequest>,
) -> Result<Json<ChecklistView>, AppError> {
    request.validate()?;
    visible_trip(&state, &current, &id).await?;
    let user = current.require_user()?;
    let stored = state
        .sharing
        .toggle_item(&id, &user.uuid, &request.category, &request.label)
        .await?;
    Ok(Json(stored.into()))
}

async fn add_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ChecklistItemRequest>,
) -> Result<Json<ChecklistView>, AppError> {
    request.validate()?;
    visible_trip(&state, &current, &id).await?;
    let user = current.require_user()?;
    let stored = state
        .sharing
        .add_item(&id, &user.uuid, &request.category, &request.label)
        .await?;
    Ok(Json(stored.into()))
}
