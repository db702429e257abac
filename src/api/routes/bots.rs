use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::clamp_limit;
use crate::api::AppState;
use crate::bot::BotStatus;
use crate::db::{BotRecord, Store};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct BotQueryParams {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/bots", get(list_bots))
        .with_state(state)
}

/// GET /bots?status=recording
async fn list_bots(
    State(state): State<AppState>,
    Query(params): Query<BotQueryParams>,
) -> ApiResult<Json<Vec<BotRecord>>> {
    let bots = match params.status.as_deref() {
        Some(raw) => {
            let status = BotStatus::parse(raw).map_err(|e| ApiError::bad_request(e.to_string()))?;
            let mut bots = state.store.list_bots_by_status(&[status]).await?;
            bots.truncate(clamp_limit(params.limit));
            bots
        }
        None => state.store.list_bots(clamp_limit(params.limit)).await?,
    };
    Ok(Json(bots))
}
