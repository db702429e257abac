//! Bot creation for calendar events.
//!
//! Creation is idempotent per calendar event: the meeting row is claimed with
//! an insert-if-absent before the provider is called, so concurrent or
//! repeated requests for the same event dispatch at most one bot.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use crate::config::BotConfig;
use crate::db::schemas::JOIN_MINUTES_RANGE;
use crate::db::{BotRecord, CalendarEventRecord, Inserted, MeetingRecord, NewBot, NewMeeting, Store};
use crate::provider::{BotProvider, CreateBotRequest, ProviderError};

/// Provider limit on bot display names, in characters.
pub const MAX_BOT_NAME_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Calendar event {0} has no meeting URL")]
    MissingMeetingUrl(i64),

    #[error("Recording is not enabled for calendar event {0}")]
    RecordingDisabled(i64),

    #[error("Calendar event {0} not found")]
    EventNotFound(i64),

    #[error("Bot creation failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// What `create_bot_for_event` did.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created {
        bot: BotRecord,
        meeting: MeetingRecord,
    },
    /// A bot or meeting already existed for the event; nothing was dispatched.
    AlreadyScheduled {
        bot: Option<BotRecord>,
        meeting: Option<MeetingRecord>,
    },
    /// The join time has already passed.
    SkippedPastJoinTime { join_at: DateTime<Utc> },
}

impl CreateOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::AlreadyScheduled { .. } => "already_scheduled",
            Self::SkippedPastJoinTime { .. } => "skipped_past_join_time",
        }
    }
}

/// Display name the bot shows in the call.
pub fn bot_display_name(prefix: &str, title: &str) -> String {
    let title = title.trim();
    let name = if title.is_empty() {
        prefix.to_string()
    } else {
        format!("{}: {}", prefix, title)
    };
    name.chars().take(MAX_BOT_NAME_CHARS).collect()
}

pub struct BotLifecycleController {
    store: Arc<dyn Store>,
    provider: Arc<dyn BotProvider>,
    clock: Arc<dyn Clock>,
    config: BotConfig,
    transcription_provider: String,
}

impl BotLifecycleController {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn BotProvider>,
        clock: Arc<dyn Clock>,
        config: BotConfig,
        transcription_provider: String,
    ) -> Self {
        Self {
            store,
            provider,
            clock,
            config,
            transcription_provider,
        }
    }

    pub async fn create_bot_for_event(
        &self,
        event: &CalendarEventRecord,
        user_id: i64,
    ) -> Result<CreateOutcome, LifecycleError> {
        let meeting_url = event
            .meeting_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(LifecycleError::MissingMeetingUrl(event.id))?;

        if !event.recording_enabled {
            return Err(LifecycleError::RecordingDisabled(event.id));
        }

        if let Some(bot) = self.store.get_bot_by_calendar_event_id(event.id).await? {
            debug!("Event {} already has bot {}", event.id, bot.provider_bot_id);
            let meeting = self.store.get_meeting_by_calendar_event_id(event.id).await?;
            return Ok(CreateOutcome::AlreadyScheduled {
                bot: Some(bot),
                meeting,
            });
        }

        let join_at = event.start_time - Duration::minutes(self.join_minutes_before(user_id).await?);
        if join_at <= self.clock.now() {
            info!(
                "Skipping bot for event {}: join time {} has passed",
                event.id,
                join_at.to_rfc3339()
            );
            return Ok(CreateOutcome::SkippedPastJoinTime { join_at });
        }

        let meeting = match self
            .store
            .create_meeting(NewMeeting {
                user_id,
                calendar_event_id: event.id,
                title: event.title.clone(),
                start_time: event.start_time,
                end_time: event.end_time,
                platform: event.platform.clone(),
                attendees: event.attendees.clone(),
            })
            .await?
        {
            Inserted::Created(meeting) => meeting,
            Inserted::Existing(meeting) => {
                debug!("Meeting {} already claimed for event {}", meeting.id, event.id);
                let bot = self.store.get_bot_by_calendar_event_id(event.id).await?;
                return Ok(CreateOutcome::AlreadyScheduled {
                    bot,
                    meeting: Some(meeting),
                });
            }
        };

        let request = CreateBotRequest {
            meeting_url: meeting_url.to_string(),
            join_at,
            bot_name: bot_display_name(&self.config.display_name_prefix, &event.title),
            transcription_provider: self.transcription_provider.clone(),
        };

        let provider_bot_id = match self.provider.create_bot(&request).await {
            Ok(id) => id,
            Err(e) => {
                error!("Provider rejected bot for event {}: {}", event.id, e);
                let diagnostic = format!("Bot creation failed: {}", e);
                if let Err(store_err) = self.store.fail_meeting(meeting.id, &diagnostic).await {
                    error!("Failed to mark meeting {} failed: {:?}", meeting.id, store_err);
                }
                return Err(LifecycleError::Provider(e));
            }
        };

        let bot = match self
            .record_bot(
                meeting.id,
                NewBot {
                    provider_bot_id: provider_bot_id.clone(),
                    user_id,
                    calendar_event_id: event.id,
                    meeting_url: meeting_url.to_string(),
                    join_at,
                },
            )
            .await
        {
            Ok(bot) => bot,
            Err(e) => {
                // The provider bot exists but is untracked; fail the claimed
                // meeting rather than leave it scheduled with no bot.
                error!(
                    "Failed to record bot {} for event {}: {:#}",
                    provider_bot_id, event.id, e
                );
                let diagnostic = format!(
                    "Bot {} was created but could not be recorded: {:#}",
                    provider_bot_id, e
                );
                if let Err(store_err) = self.store.fail_meeting(meeting.id, &diagnostic).await {
                    error!("Failed to mark meeting {} failed: {:?}", meeting.id, store_err);
                }
                return Err(LifecycleError::Storage(e));
            }
        };

        let meeting = self.store.get_meeting(meeting.id).await?.unwrap_or(meeting);

        info!(
            "Scheduled bot {} for event {} (joins at {})",
            bot.provider_bot_id,
            event.id,
            join_at.to_rfc3339()
        );
        Ok(CreateOutcome::Created { bot, meeting })
    }

    /// Store the new bot and link the claimed meeting to it.
    async fn record_bot(&self, meeting_id: i64, new_bot: NewBot) -> anyhow::Result<BotRecord> {
        let bot = match self.store.create_bot(new_bot).await? {
            Inserted::Created(bot) => bot,
            Inserted::Existing(bot) => {
                warn!(
                    "Event {} already had bot {} when storing a new one",
                    bot.calendar_event_id, bot.provider_bot_id
                );
                bot
            }
        };
        self.store.link_meeting_to_bot(meeting_id, bot.id).await?;
        Ok(bot)
    }

    /// Toggle recording for an event. Enabling dispatches a bot if needed;
    /// disabling leaves any existing bot alone.
    pub async fn set_recording(
        &self,
        event_id: i64,
        enabled: bool,
    ) -> Result<Option<CreateOutcome>, LifecycleError> {
        if !self.store.set_recording_enabled(event_id, enabled).await? {
            return Err(LifecycleError::EventNotFound(event_id));
        }
        if !enabled {
            info!("Recording disabled for event {}", event_id);
            return Ok(None);
        }

        let event = self
            .store
            .get_calendar_event(event_id)
            .await?
            .ok_or(LifecycleError::EventNotFound(event_id))?;
        let outcome = self.create_bot_for_event(&event, event.user_id).await?;
        Ok(Some(outcome))
    }

    async fn join_minutes_before(&self, user_id: i64) -> anyhow::Result<i64> {
        let settings = self.store.get_settings_by_user_id(user_id).await?;
        if JOIN_MINUTES_RANGE.contains(&settings.bot_join_minutes_before) {
            Ok(settings.bot_join_minutes_before)
        } else {
            warn!(
                "User {} has out-of-range join offset {}; using {}",
                user_id, settings.bot_join_minutes_before, self.config.default_join_minutes_before
            );
            Ok(self.config.default_join_minutes_before)
        }
    }
}
