//! Meeting and follow-up content routes.

use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::clamp_limit;
use crate::api::AppState;
use crate::content::{ContentType, SocialPlatform};
use crate::db::{MeetingContentRecord, MeetingRecord, Store};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct MeetingQueryParams {
    pub user_id: Option<i64>,
    /// Maximum results (default 20)
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentRequest {
    pub content_type: ContentType,
    pub platform: Option<SocialPlatform>,
    pub automation_id: Option<i64>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/meetings", get(list_meetings))
        .route("/meetings/:id", get(get_meeting))
        .route(
            "/meetings/:id/content",
            get(list_content).post(generate_content),
        )
        .with_state(state)
}

/// GET /meetings - Most recent meetings first.
async fn list_meetings(
    State(state): State<AppState>,
    Query(params): Query<MeetingQueryParams>,
) -> ApiResult<Json<Vec<MeetingRecord>>> {
    let meetings = state
        .store
        .list_meetings(params.user_id, clamp_limit(params.limit))
        .await?;
    Ok(Json(meetings))
}

/// GET /meetings/:id
async fn get_meeting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MeetingRecord>> {
    let meeting = state
        .store
        .get_meeting(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Meeting {} not found", id)))?;
    Ok(Json(meeting))
}

/// POST /meetings/:id/content - Generate a draft email or social post.
async fn generate_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<GenerateContentRequest>,
) -> ApiResult<(StatusCode, Json<MeetingContentRecord>)> {
    match (req.content_type, req.platform) {
        (ContentType::SocialPost, None) => {
            return Err(ApiError::bad_request("Social posts require a platform"));
        }
        (ContentType::Email, Some(_)) => {
            return Err(ApiError::bad_request("Emails do not take a platform"));
        }
        _ => {}
    }

    let record = state
        .content
        .generate_for_meeting(id, req.content_type, req.platform, req.automation_id)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /meetings/:id/content
async fn list_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<MeetingContentRecord>>> {
    if state.store.get_meeting(id).await?.is_none() {
        return Err(ApiError::not_found(format!("Meeting {} not found", id)));
    }
    Ok(Json(state.store.list_meeting_contents(id).await?))
}
