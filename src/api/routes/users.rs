//! User and settings routes.

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::{Store, UserRecord, UserSettings};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id/settings", get(get_settings).put(update_settings))
        .with_state(state)
}

/// POST /users - Register a user, or return the existing one.
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserRecord>)> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }

    let id = state.store.upsert_user(&email).await?;
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::internal(format!("User {} vanished after insert", id)))?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/:id/settings
async fn get_settings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserSettings>> {
    require_user(&state, id).await?;
    Ok(Json(state.store.get_settings_by_user_id(id).await?))
}

/// PUT /users/:id/settings
async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(settings): Json<UserSettings>,
) -> ApiResult<Json<UserSettings>> {
    require_user(&state, id).await?;
    settings
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    state.store.save_settings(id, settings).await?;
    info!(
        "Updated settings for user {} (join {} min before, auto_record={})",
        id, settings.bot_join_minutes_before, settings.auto_record
    );
    Ok(Json(settings))
}

pub(crate) async fn require_user(state: &AppState, id: i64) -> ApiResult<()> {
    match state.store.get_user(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found(format!("User {} not found", id))),
    }
}
