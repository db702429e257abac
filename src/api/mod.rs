//! REST API server for meetsync.
//!
//! Provides HTTP endpoints for:
//! - User registration and bot settings
//! - Calendar event ingestion and recording toggles
//! - Meeting, bot and transcript inspection
//! - Follow-up content generation
//! - On-demand reconciliation sweeps

pub mod error;
pub mod routes;


use crate::bot::{BotLifecycleController, ReconciliationScheduler};
use crate::calendar::MeetingLinkDetector;
use crate::config::ApiConfig;
use crate::content::ContentService;
use crate::db::SqliteStore;
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tracing::info;

/// Shared handles for all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub lifecycle: Arc<BotLifecycleController>,
    pub scheduler: Arc<ReconciliationScheduler>,
    pub content: Arc<ContentService>,
    pub links: Arc<MeetingLinkDetector>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(health))
        .merge(routes::users::router(state.clone()))
        .merge(routes::events::router(state.clone()))
        .merge(routes::meetings::router(state.clone()))
        .merge(routes::bots::router(state.clone()))
        .merge(routes::sweep::router(state))
        .layer(ServiceBuilder::new())
}

pub struct ApiServer {
    host: String,
    port: u16,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: &ApiConfig, state: AppState) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            state,
        }
    }

    /// Serve until `shutdown` is cancelled.
    pub async fn start(self, shutdown: CancellationToken) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("API server listening on http://{}", addr);
        info!("Endpoints:");
        info!("  GET  /                       - Service info");
        info!("  GET  /health                 - Health check");
        info!("  POST /users                  - Register a user");
        info!("  PUT  /users/:id/settings     - Update bot settings");
        info!("  POST /users/:id/events       - Ingest a calendar event");
        info!("  GET  /users/:id/events       - List calendar events");
        info!("  POST /events/:id/recording   - Enable or disable recording");
        info!("  GET  /meetings               - List meetings");
        info!("  GET  /meetings/:id           - Get a meeting");
        info!("  POST /meetings/:id/content   - Generate follow-up content");
        info!("  GET  /meetings/:id/content   - List generated content");
        info!("  GET  /bots                   - List bots");
        info!("  POST /sweep                  - Run a reconciliation sweep");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "meetsync",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
