use crate::api::{ApiServer, AppState};
use crate::bot::{
    BotLifecycleController, Clock, QuiescenceWindows, ReconciliationScheduler, SystemClock,
    TranscriptReadinessEvaluator,
};
use crate::calendar::MeetingLinkDetector;
use crate::config::Config;
use crate::content::{ContentService, ShellCommandGenerator};
use crate::db::SqliteStore;
use crate::provider::{BotProvider, RecallProvider};
use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Engine components wired from configuration.
pub struct Services {
    pub store: Arc<SqliteStore>,
    pub lifecycle: Arc<BotLifecycleController>,
    pub scheduler: Arc<ReconciliationScheduler>,
    pub content: Arc<ContentService>,
}

impl Services {
    pub fn build(config: &Config, store: Arc<SqliteStore>) -> Result<Self> {
        let provider: Arc<dyn BotProvider> = Arc::new(RecallProvider::new(&config.provider)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let lifecycle = Arc::new(BotLifecycleController::new(
            store.clone(),
            provider.clone(),
            clock.clone(),
            config.bot.clone(),
            config.provider.transcription_provider.clone(),
        ));

        let evaluator = TranscriptReadinessEvaluator::new(
            store.clone(),
            provider.clone(),
            clock,
            QuiescenceWindows::from_config(&config.scheduler),
        );
        let scheduler = Arc::new(ReconciliationScheduler::new(
            store.clone(),
            provider,
            evaluator,
            config.scheduler.poll_interval(),
        ));

        let generator = ShellCommandGenerator::new(
            config.content.command.clone(),
            config.content.timeout_seconds,
        );
        let content = Arc::new(ContentService::new(store.clone(), Arc::new(generator)));

        Ok(Self {
            store,
            lifecycle,
            scheduler,
            content,
        })
    }

    pub fn api_state(&self) -> Result<AppState> {
        Ok(AppState {
            store: self.store.clone(),
            lifecycle: self.lifecycle.clone(),
            scheduler: self.scheduler.clone(),
            content: self.content.clone(),
            links: Arc::new(MeetingLinkDetector::new()?),
        })
    }
}

pub async fn run_service() -> Result<()> {
    info!("Starting meetsync service");

    let config = Config::load()?;
    if config.provider.api_key.is_none() {
        warn!("No provider API key configured; provider calls will be rejected");
    }
    if config.content.command.trim().is_empty() {
        info!("No content command configured; content generation is disabled");
    }

    let store = Arc::new(SqliteStore::open_default()?);
    let services = Services::build(&config, store)?;
    let shutdown = CancellationToken::new();

    let api_server = ApiServer::new(&config.api, services.api_state()?);
    let api_shutdown = shutdown.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api_server.start(api_shutdown).await {
            error!("API server failed: {}", e);
        }
    });

    services.scheduler.start()?;
    info!("meetsync is ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    shutdown.cancel();
    services.scheduler.stop().await?;
    if let Err(e) = api_handle.await {
        warn!("API server task ended abnormally: {}", e);
    }

    info!("meetsync stopped");
    Ok(())
}
