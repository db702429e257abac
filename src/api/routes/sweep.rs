use crate::api::{error::ApiError, AppState};
use crate::bot::SweepReport;
use axum::{extract::State, response::Json, routing::post, Router};
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sweep", post(run_sweep))
        .with_state(state)
}

/// POST /sweep - Reconcile now instead of waiting for the next tick.
///
/// The sweep runs on its own task so a dropped connection cannot cut it short.
async fn run_sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, ApiError> {
    info!("Sweep requested via API");
    let scheduler = state.scheduler.clone();
    let report = tokio::spawn(async move { scheduler.sweep().await })
        .await
        .map_err(|e| ApiError::internal(format!("Sweep task failed: {}", e)))?;
    Ok(Json(report))
}
