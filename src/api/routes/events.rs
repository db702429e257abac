//! Calendar event ingestion and recording toggles.

use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::{clamp_limit, users::require_user};
use crate::api::AppState;
use crate::bot::CreateOutcome;
use crate::db::{CalendarEventRecord, NewCalendarEvent, Store};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// A calendar event as delivered by a calendar sync.
#[derive(Debug, Deserialize)]
pub struct IngestEventRequest {
    pub external_id: String,
    #[serde(default)]
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub calendar_account: Option<String>,
    /// Explicit conference link, when the calendar provides one
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecordingRequest {
    pub enabled: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users/:id/events", post(ingest_event).get(list_events))
        .route("/events/:id/recording", post(set_recording))
        .with_state(state)
}

/// POST /users/:id/events - Upsert a calendar event and auto-schedule a bot
/// when the user records everything.
async fn ingest_event(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<IngestEventRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require_user(&state, user_id).await?;

    if req.external_id.trim().is_empty() {
        return Err(ApiError::bad_request("external_id is required"));
    }
    if req.end_time < req.start_time {
        return Err(ApiError::bad_request("end_time is before start_time"));
    }

    let link = state.links.extract(
        req.meeting_link.as_deref(),
        req.location.as_deref(),
        req.description.as_deref(),
    );
    let settings = state.store.get_settings_by_user_id(user_id).await?;
    let platform = link
        .as_ref()
        .map(|l| l.platform.as_str())
        .unwrap_or("unknown");

    let event = state
        .store
        .upsert_calendar_event(NewCalendarEvent {
            user_id,
            calendar_account: req.calendar_account,
            external_id: req.external_id.trim().to_string(),
            title: req.title.trim().to_string(),
            start_time: req.start_time,
            end_time: req.end_time,
            meeting_url: link.as_ref().map(|l| l.url.clone()),
            platform: platform.to_string(),
            recording_enabled: settings.auto_record && link.is_some(),
            attendees: req.attendees,
        })
        .await?;

    info!(
        "Ingested event {} for user {} (platform={}, recording={})",
        event.id, user_id, event.platform, event.recording_enabled
    );

    let mut body = json!({ "event": event });
    if event.recording_enabled && event.meeting_url.is_some() {
        match state.lifecycle.create_bot_for_event(&event, user_id).await {
            Ok(outcome) => body["bot"] = json!(outcome.label()),
            Err(e) => {
                warn!("Auto-scheduling bot for event {} failed: {}", event.id, e);
                body["bot_error"] = json!(e.to_string());
            }
        }
    }

    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /users/:id/events
async fn list_events(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<CalendarEventRecord>>> {
    require_user(&state, user_id).await?;
    let events = state
        .store
        .list_calendar_events(user_id, clamp_limit(params.limit))
        .await?;
    Ok(Json(events))
}

/// POST /events/:id/recording - Enable or disable recording for an event.
async fn set_recording(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<RecordingRequest>,
) -> ApiResult<Json<Value>> {
    let outcome = state.lifecycle.set_recording(event_id, req.enabled).await?;

    let mut body = json!({
        "event_id": event_id,
        "recording_enabled": req.enabled,
        "bot": outcome.as_ref().map(CreateOutcome::label),
    });
    if let Some(CreateOutcome::Created { bot, meeting }) = &outcome {
        body["bot_id"] = json!(bot.id);
        body["meeting_id"] = json!(meeting.id);
    }
    Ok(Json(body))
}
