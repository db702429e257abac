//! Periodic reconciliation of local bot state against the provider.
//!
//! Each sweep polls active bots for status changes and then tries to collect
//! transcripts for completed bots. Failures are isolated per bot.

use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::readiness::{FetchOutcome, TranscriptReadinessEvaluator};
use super::status::BotStatus;
use crate::db::{BotRecord, Store};
use crate::provider::{BotProvider, ProviderError};

/// Counters for one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub sweep_id: Option<String>,
    pub polled: usize,
    pub transitioned: usize,
    pub transcripts_stored: usize,
    pub not_ready: usize,
    pub errors: usize,
    /// Another sweep was already running.
    pub skipped: bool,
}

impl SweepReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

struct RunningLoop {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

/// Clears the in-progress flag when a sweep ends, including by panic.
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ReconciliationScheduler {
    store: Arc<dyn Store>,
    provider: Arc<dyn BotProvider>,
    evaluator: TranscriptReadinessEvaluator,
    poll_interval: Duration,
    sweeping: AtomicBool,
    running: Mutex<Option<RunningLoop>>,
}

impl ReconciliationScheduler {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn BotProvider>,
        evaluator: TranscriptReadinessEvaluator,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            evaluator,
            poll_interval,
            sweeping: AtomicBool::new(false),
            running: Mutex::new(None),
        }
    }

    /// Spawn the recurring sweep loop. The first sweep runs immediately.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let mut running = self
            .running
            .lock()
            .map_err(|_| anyhow::anyhow!("Scheduler state lock poisoned"))?;
        if running.is_some() {
            bail!("Reconciliation scheduler is already running");
        }

        let cancellation = CancellationToken::new();
        let cancel = cancellation.clone();
        let scheduler = Arc::clone(self);
        let interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            info!(
                "Starting reconciliation scheduler (interval={}s)",
                interval.as_secs()
            );
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Reconciliation loop cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        scheduler.sweep().await;
                    }
                }
            }
        });

        *running = Some(RunningLoop {
            cancellation,
            handle,
        });
        Ok(())
    }

    /// Cancel the loop and wait for it to exit. An in-flight sweep finishes first.
    pub async fn stop(&self) -> Result<()> {
        let running = self
            .running
            .lock()
            .map_err(|_| anyhow::anyhow!("Scheduler state lock poisoned"))?
            .take();

        let Some(running) = running else {
            debug!("Reconciliation scheduler not running");
            return Ok(());
        };

        running.cancellation.cancel();
        if let Err(e) = running.handle.await {
            warn!("Reconciliation loop ended abnormally: {}", e);
        }
        info!("Reconciliation scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|running| running.is_some())
            .unwrap_or(false)
    }

    /// Run one reconciliation pass now.
    pub async fn sweep(&self) -> SweepReport {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Sweep already in progress; skipping");
            return SweepReport::skipped();
        }
        let _guard = SweepGuard(&self.sweeping);

        let sweep_id = Uuid::new_v4().to_string();
        let span = info_span!("sweep", id = %sweep_id);
        let mut report = self.run_sweep().instrument(span).await;
        report.sweep_id = Some(sweep_id);
        report
    }

    async fn run_sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match self.store.list_bots_by_status(&BotStatus::ACTIVE).await {
            Ok(bots) => {
                for bot in bots {
                    report.polled += 1;
                    match self.reconcile_status(&bot).await {
                        Ok(true) => report.transitioned += 1,
                        Ok(false) => {}
                        Err(e) => {
                            report.errors += 1;
                            if is_gone(&e) {
                                warn!(
                                    "Provider no longer knows bot {}; leaving it {}",
                                    bot.provider_bot_id,
                                    bot.status.as_str()
                                );
                            } else {
                                warn!("Failed to reconcile bot {}: {:#}", bot.provider_bot_id, e);
                            }
                        }
                    }
                }
            }
            Err(e) => {
                report.errors += 1;
                error!("Failed to load active bots: {:#}", e);
            }
        }

        match self.store.list_bots_awaiting_transcript().await {
            Ok(bots) => {
                for bot in bots {
                    match self.collect_transcript(&bot).await {
                        Ok(FetchOutcome::Stored) => report.transcripts_stored += 1,
                        Ok(outcome) if outcome.is_not_ready() => report.not_ready += 1,
                        Ok(_) => {}
                        Err(e) => {
                            report.errors += 1;
                            warn!(
                                "Failed to collect transcript for bot {}: {:#}",
                                bot.provider_bot_id, e
                            );
                        }
                    }
                }
            }
            Err(e) => {
                report.errors += 1;
                error!("Failed to load bots awaiting transcripts: {:#}", e);
            }
        }

        info!(
            polled = report.polled,
            transitioned = report.transitioned,
            transcripts_stored = report.transcripts_stored,
            not_ready = report.not_ready,
            errors = report.errors,
            "Sweep finished"
        );
        report
    }

    /// Apply the provider's latest status to the bot and its meeting.
    /// Returns whether the bot transitioned.
    async fn reconcile_status(&self, bot: &BotRecord) -> Result<bool> {
        let snapshot = self.provider.get_bot(&bot.provider_bot_id).await?;

        let Some(code) = snapshot.latest_status_code() else {
            debug!("Bot {} has no status changes yet", bot.provider_bot_id);
            return Ok(false);
        };
        let Some(observed) = BotStatus::from_provider_code(code) else {
            debug!("Bot {} reported unmapped status {}", bot.provider_bot_id, code);
            return Ok(false);
        };
        let Some(next) = bot.status.advance(observed) else {
            return Ok(false);
        };

        // Bot and meeting move in one transaction.
        if !self.store.transition_bot(bot.id, next).await? {
            debug!("Bot {} changed underneath the sweep", bot.provider_bot_id);
            return Ok(false);
        }
        info!(
            "Bot {} {} -> {} ({})",
            bot.provider_bot_id,
            bot.status.as_str(),
            next.as_str(),
            code
        );
        Ok(true)
    }

    async fn collect_transcript(&self, bot: &BotRecord) -> Result<FetchOutcome> {
        let Some(meeting) = self.store.get_meeting_by_bot_id(bot.id).await? else {
            debug!("Bot {} has no linked meeting", bot.provider_bot_id);
            return Ok(FetchOutcome::Skipped);
        };
        self.evaluator.attempt_transcript_fetch(bot, &meeting).await
    }
}

fn is_gone(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ProviderError>()
        .is_some_and(ProviderError::is_not_found)
}
