//! Scripted in-memory provider and store wrapper for engine tests.

use anyhow::bail;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::bot::status::BotStatus;
use crate::db::{
    BotRecord, CalendarEventRecord, Inserted, MeetingRecord, NewBot, NewCalendarEvent, NewMeeting,
    SqliteStore, Store, UserSettings,
};
use crate::provider::{BotProvider, BotSnapshot, CreateBotRequest, ProviderError, TranscriptSource};

#[derive(Debug, Clone)]
enum ScriptedTranscript {
    Payload(Value),
    Fail(u16),
}

#[derive(Default)]
pub(crate) struct FakeProvider {
    snapshots: Mutex<HashMap<String, BotSnapshot>>,
    transcripts: Mutex<Vec<(TranscriptSource, ScriptedTranscript)>>,
    create_failure: Mutex<Option<u16>>,
    created: Mutex<Vec<CreateBotRequest>>,
    get_bot_calls: AtomicUsize,
    transcript_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn set_snapshot(&self, provider_bot_id: &str, snapshot: BotSnapshot) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(provider_bot_id.to_string(), snapshot);
    }

    pub fn set_transcript(&self, source: TranscriptSource, payload: Value) {
        self.transcripts
            .lock()
            .unwrap()
            .push((source, ScriptedTranscript::Payload(payload)));
    }

    pub fn fail_transcript(&self, source: TranscriptSource, status: u16) {
        self.transcripts
            .lock()
            .unwrap()
            .push((source, ScriptedTranscript::Fail(status)));
    }

    pub fn fail_create(&self, status: u16) {
        *self.create_failure.lock().unwrap() = Some(status);
    }

    pub fn created(&self) -> Vec<CreateBotRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn get_bot_calls(&self) -> usize {
        self.get_bot_calls.load(Ordering::SeqCst)
    }

    pub fn transcript_calls(&self) -> usize {
        self.transcript_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BotProvider for FakeProvider {
    async fn create_bot(&self, request: &CreateBotRequest) -> Result<String, ProviderError> {
        if let Some(status) = *self.create_failure.lock().unwrap() {
            return Err(ProviderError::Status {
                status,
                body: "scripted failure".to_string(),
            });
        }
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        Ok(format!("bot-{}", created.len()))
    }

    async fn get_bot(&self, provider_bot_id: &str) -> Result<BotSnapshot, ProviderError> {
        self.get_bot_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .lock()
            .unwrap()
            .get(provider_bot_id)
            .cloned()
            .ok_or(ProviderError::Status {
                status: 404,
                body: format!("unknown bot {}", provider_bot_id),
            })
    }

    async fn fetch_transcript(&self, source: &TranscriptSource) -> Result<Option<Value>, ProviderError> {
        self.transcript_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .transcripts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(s, _)| s == source)
            .map(|(_, t)| t.clone());
        match scripted {
            Some(ScriptedTranscript::Payload(value)) => Ok(Some(value)),
            Some(ScriptedTranscript::Fail(status)) => Err(ProviderError::Status {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(None),
        }
    }
}

/// `SqliteStore` that fails chosen operations a set number of times.
pub(crate) struct FailingStore {
    inner: Arc<SqliteStore>,
    failures: Mutex<HashMap<&'static str, usize>>,
}

impl FailingStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Fail the next `times` calls to `operation`.
    pub fn fail(&self, operation: &'static str, times: usize) {
        self.failures.lock().unwrap().insert(operation, times);
    }

    fn check(&self, operation: &'static str) -> anyhow::Result<()> {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(operation) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                bail!("scripted {} failure", operation)
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn get_settings_by_user_id(&self, user_id: i64) -> anyhow::Result<UserSettings> {
        self.check("get_settings_by_user_id")?;
        self.inner.get_settings_by_user_id(user_id).await
    }

    async fn get_calendar_event(&self, id: i64) -> anyhow::Result<Option<CalendarEventRecord>> {
        self.check("get_calendar_event")?;
        self.inner.get_calendar_event(id).await
    }

    async fn set_recording_enabled(&self, event_id: i64, enabled: bool) -> anyhow::Result<bool> {
        self.check("set_recording_enabled")?;
        self.inner.set_recording_enabled(event_id, enabled).await
    }

    async fn get_bot_by_calendar_event_id(
        &self,
        calendar_event_id: i64,
    ) -> anyhow::Result<Option<BotRecord>> {
        self.check("get_bot_by_calendar_event_id")?;
        self.inner.get_bot_by_calendar_event_id(calendar_event_id).await
    }

    async fn create_bot(&self, bot: NewBot) -> anyhow::Result<Inserted<BotRecord>> {
        self.check("create_bot")?;
        self.inner.create_bot(bot).await
    }

    async fn list_bots_by_status(&self, statuses: &[BotStatus]) -> anyhow::Result<Vec<BotRecord>> {
        self.check("list_bots_by_status")?;
        self.inner.list_bots_by_status(statuses).await
    }

    async fn transition_bot(&self, id: i64, status: BotStatus) -> anyhow::Result<bool> {
        self.check("transition_bot")?;
        self.inner.transition_bot(id, status).await
    }

    async fn list_bots_awaiting_transcript(&self) -> anyhow::Result<Vec<BotRecord>> {
        self.check("list_bots_awaiting_transcript")?;
        self.inner.list_bots_awaiting_transcript().await
    }

    async fn create_meeting(&self, meeting: NewMeeting) -> anyhow::Result<Inserted<MeetingRecord>> {
        self.check("create_meeting")?;
        self.inner.create_meeting(meeting).await
    }

    async fn get_meeting(&self, id: i64) -> anyhow::Result<Option<MeetingRecord>> {
        self.check("get_meeting")?;
        self.inner.get_meeting(id).await
    }

    async fn get_meeting_by_calendar_event_id(
        &self,
        calendar_event_id: i64,
    ) -> anyhow::Result<Option<MeetingRecord>> {
        self.check("get_meeting_by_calendar_event_id")?;
        self.inner.get_meeting_by_calendar_event_id(calendar_event_id).await
    }

    async fn get_meeting_by_bot_id(&self, bot_id: i64) -> anyhow::Result<Option<MeetingRecord>> {
        self.check("get_meeting_by_bot_id")?;
        self.inner.get_meeting_by_bot_id(bot_id).await
    }

    async fn link_meeting_to_bot(&self, meeting_id: i64, bot_id: i64) -> anyhow::Result<()> {
        self.check("link_meeting_to_bot")?;
        self.inner.link_meeting_to_bot(meeting_id, bot_id).await
    }

    async fn fail_meeting(&self, id: i64, diagnostic: &str) -> anyhow::Result<bool> {
        self.check("fail_meeting")?;
        self.inner.fail_meeting(id, diagnostic).await
    }

    async fn complete_meeting_with_transcript(&self, id: i64, transcript: &str) -> anyhow::Result<bool> {
        self.check("complete_meeting_with_transcript")?;
        self.inner.complete_meeting_with_transcript(id, transcript).await
    }
}

/// Seed a user, calendar event (start 2024-06-01T15:00Z), scheduled bot and
/// linked meeting.
pub(crate) async fn seed_bot_and_meeting(
    store: &SqliteStore,
    provider_bot_id: &str,
) -> (BotRecord, MeetingRecord) {
    let user_id = store.upsert_user("ada@example.com").await.unwrap();
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap();
    let event = store
        .upsert_calendar_event(NewCalendarEvent {
            user_id,
            calendar_account: None,
            external_id: format!("evt-{}", provider_bot_id),
            title: "Planning".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(30),
            meeting_url: Some("https://zoom.us/j/123456789".to_string()),
            platform: "zoom".to_string(),
            recording_enabled: true,
            attendees: Vec::new(),
        })
        .await
        .unwrap();

    let meeting = store
        .create_meeting(NewMeeting {
            user_id,
            calendar_event_id: event.id,
            title: event.title.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            platform: event.platform.clone(),
            attendees: Vec::new(),
        })
        .await
        .unwrap()
        .into_inner();

    let bot = store
        .create_bot(NewBot {
            provider_bot_id: provider_bot_id.to_string(),
            user_id,
            calendar_event_id: event.id,
            meeting_url: "https://zoom.us/j/123456789".to_string(),
            join_at: start - Duration::minutes(5),
        })
        .await
        .unwrap()
        .into_inner();

    store.link_meeting_to_bot(meeting.id, bot.id).await.unwrap();
    let meeting = store.get_meeting(meeting.id).await.unwrap().unwrap();
    (bot, meeting)
}
