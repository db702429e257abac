//! Async persistence gateway used by the bot engine.
//!
//! Repositories are synchronous rusqlite code; `SqliteStore` runs them on the
//! blocking pool behind a shared connection.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use super::bots::BotRepository;
use super::contents::MeetingContentRepository;
use super::events::CalendarEventRepository;
use super::init::{init_db, migrate};
use super::meetings::MeetingRepository;
use super::schemas::{
    BotRecord, CalendarEventRecord, Inserted, MeetingContentRecord, MeetingRecord, NewBot,
    NewCalendarEvent, NewMeeting, NewMeetingContent, UserRecord, UserSettings,
};
use super::users::UserRepository;
use crate::bot::status::BotStatus;

/// Storage operations the lifecycle controller and scheduler depend on.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_settings_by_user_id(&self, user_id: i64) -> Result<UserSettings>;

    async fn get_calendar_event(&self, id: i64) -> Result<Option<CalendarEventRecord>>;

    async fn set_recording_enabled(&self, event_id: i64, enabled: bool) -> Result<bool>;

    async fn get_bot_by_calendar_event_id(&self, calendar_event_id: i64) -> Result<Option<BotRecord>>;

    /// Insert-if-absent keyed on the calendar event.
    async fn create_bot(&self, bot: NewBot) -> Result<Inserted<BotRecord>>;

    async fn list_bots_by_status(&self, statuses: &[BotStatus]) -> Result<Vec<BotRecord>>;

    /// Advance the bot and promote its meeting atomically. False if the bot
    /// was already terminal.
    async fn transition_bot(&self, id: i64, status: BotStatus) -> Result<bool>;

    async fn list_bots_awaiting_transcript(&self) -> Result<Vec<BotRecord>>;

    /// Insert-if-absent keyed on the calendar event.
    async fn create_meeting(&self, meeting: NewMeeting) -> Result<Inserted<MeetingRecord>>;

    async fn get_meeting(&self, id: i64) -> Result<Option<MeetingRecord>>;

    async fn get_meeting_by_calendar_event_id(&self, calendar_event_id: i64) -> Result<Option<MeetingRecord>>;

    async fn get_meeting_by_bot_id(&self, bot_id: i64) -> Result<Option<MeetingRecord>>;

    async fn link_meeting_to_bot(&self, meeting_id: i64, bot_id: i64) -> Result<()>;

    async fn fail_meeting(&self, id: i64, diagnostic: &str) -> Result<bool>;

    /// Atomically set transcript and `completed`; false if a transcript exists.
    async fn complete_meeting_with_transcript(&self, id: i64, transcript: &str) -> Result<bool>;
}

/// SQLite-backed store sharing one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open the database in the user data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::from_connection(init_db()?))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        migrate(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn call<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| anyhow!("Database connection lock poisoned"))?;
            f(&guard)
        })
        .await
        .context("Database task panicked")?
    }

    pub async fn upsert_user(&self, email: &str) -> Result<i64> {
        let email = email.to_string();
        self.call(move |conn| UserRepository::upsert(conn, &email)).await
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<UserRecord>> {
        self.call(move |conn| UserRepository::get(conn, id)).await
    }

    pub async fn save_settings(&self, user_id: i64, settings: UserSettings) -> Result<()> {
        self.call(move |conn| UserRepository::save_settings(conn, user_id, &settings))
            .await
    }

    pub async fn upsert_calendar_event(&self, event: NewCalendarEvent) -> Result<CalendarEventRecord> {
        self.call(move |conn| CalendarEventRepository::upsert(conn, &event)).await
    }

    pub async fn list_calendar_events(&self, user_id: i64, limit: usize) -> Result<Vec<CalendarEventRecord>> {
        self.call(move |conn| CalendarEventRepository::list_for_user(conn, user_id, limit))
            .await
    }

    pub async fn list_bots(&self, limit: usize) -> Result<Vec<BotRecord>> {
        self.call(move |conn| BotRepository::list(conn, limit)).await
    }

    pub async fn list_meetings(&self, user_id: Option<i64>, limit: usize) -> Result<Vec<MeetingRecord>> {
        self.call(move |conn| MeetingRepository::list(conn, user_id, limit)).await
    }

    pub async fn create_meeting_content(&self, content: NewMeetingContent) -> Result<MeetingContentRecord> {
        self.call(move |conn| MeetingContentRepository::insert(conn, &content)).await
    }

    pub async fn list_meeting_contents(&self, meeting_id: i64) -> Result<Vec<MeetingContentRecord>> {
        self.call(move |conn| MeetingContentRepository::list_for_meeting(conn, meeting_id))
            .await
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_settings_by_user_id(&self, user_id: i64) -> Result<UserSettings> {
        self.call(move |conn| UserRepository::settings(conn, user_id)).await
    }

    async fn get_calendar_event(&self, id: i64) -> Result<Option<CalendarEventRecord>> {
        self.call(move |conn| CalendarEventRepository::get(conn, id)).await
    }

    async fn set_recording_enabled(&self, event_id: i64, enabled: bool) -> Result<bool> {
        self.call(move |conn| CalendarEventRepository::set_recording_enabled(conn, event_id, enabled))
            .await
    }

    async fn get_bot_by_calendar_event_id(&self, calendar_event_id: i64) -> Result<Option<BotRecord>> {
        self.call(move |conn| BotRepository::get_by_calendar_event_id(conn, calendar_event_id))
            .await
    }

    async fn create_bot(&self, bot: NewBot) -> Result<Inserted<BotRecord>> {
        self.call(move |conn| BotRepository::insert_if_absent(conn, &bot)).await
    }

    async fn list_bots_by_status(&self, statuses: &[BotStatus]) -> Result<Vec<BotRecord>> {
        let statuses = statuses.to_vec();
        self.call(move |conn| BotRepository::list_by_status(conn, &statuses))
            .await
    }

    async fn transition_bot(&self, id: i64, status: BotStatus) -> Result<bool> {
        self.call(move |conn| BotRepository::transition(conn, id, status)).await
    }

    async fn list_bots_awaiting_transcript(&self) -> Result<Vec<BotRecord>> {
        self.call(move |conn| BotRepository::list_awaiting_transcript(conn))
            .await
    }

    async fn create_meeting(&self, meeting: NewMeeting) -> Result<Inserted<MeetingRecord>> {
        self.call(move |conn| MeetingRepository::insert_if_absent(conn, &meeting))
            .await
    }

    async fn get_meeting(&self, id: i64) -> Result<Option<MeetingRecord>> {
        self.call(move |conn| MeetingRepository::get(conn, id)).await
    }

    async fn get_meeting_by_calendar_event_id(&self, calendar_event_id: i64) -> Result<Option<MeetingRecord>> {
        self.call(move |conn| MeetingRepository::get_by_calendar_event_id(conn, calendar_event_id))
            .await
    }

    async fn get_meeting_by_bot_id(&self, bot_id: i64) -> Result<Option<MeetingRecord>> {
        self.call(move |conn| MeetingRepository::get_by_bot_id(conn, bot_id)).await
    }

    async fn link_meeting_to_bot(&self, meeting_id: i64, bot_id: i64) -> Result<()> {
        self.call(move |conn| MeetingRepository::link_bot(conn, meeting_id, bot_id))
            .await
    }

    async fn fail_meeting(&self, id: i64, diagnostic: &str) -> Result<bool> {
        let diagnostic = diagnostic.to_string();
        self.call(move |conn| MeetingRepository::fail(conn, id, &diagnostic)).await
    }

    async fn complete_meeting_with_transcript(&self, id: i64, transcript: &str) -> Result<bool> {
        let transcript = transcript.to_string();
        self.call(move |conn| MeetingRepository::complete_with_transcript(conn, id, &transcript))
            .await
    }
}
