use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::bot::status::{BotStatus, MeetingStatus};
use crate::content::{ContentType, PublishStatus, SocialPlatform};

/// Bounds accepted for `bot_join_minutes_before`.
pub const JOIN_MINUTES_RANGE: std::ops::RangeInclusive<i64> = 1..=30;

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub bot_join_minutes_before: i64,
    pub auto_record: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            bot_join_minutes_before: 5,
            auto_record: false,
        }
    }
}

impl UserSettings {
    pub fn validate(&self) -> Result<()> {
        if !JOIN_MINUTES_RANGE.contains(&self.bot_join_minutes_before) {
            anyhow::bail!(
                "bot_join_minutes_before must be between {} and {}, got {}",
                JOIN_MINUTES_RANGE.start(),
                JOIN_MINUTES_RANGE.end(),
                self.bot_join_minutes_before
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEventRecord {
    pub id: i64,
    pub user_id: i64,
    pub calendar_account: Option<String>,
    pub external_id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub meeting_url: Option<String>,
    pub platform: String,
    pub recording_enabled: bool,
    pub attendees: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewCalendarEvent {
    pub user_id: i64,
    pub calendar_account: Option<String>,
    pub external_id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub meeting_url: Option<String>,
    pub platform: String,
    pub recording_enabled: bool,
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotRecord {
    pub id: i64,
    pub provider_bot_id: String,
    pub user_id: i64,
    pub calendar_event_id: i64,
    pub meeting_url: String,
    pub join_at: DateTime<Utc>,
    pub status: BotStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewBot {
    pub provider_bot_id: String,
    pub user_id: i64,
    pub calendar_event_id: i64,
    pub meeting_url: String,
    pub join_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingRecord {
    pub id: i64,
    pub user_id: i64,
    pub calendar_event_id: Option<i64>,
    pub bot_id: Option<i64>,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub platform: String,
    pub transcript: Option<String>,
    pub attendees: Vec<String>,
    pub status: MeetingStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub user_id: i64,
    pub calendar_event_id: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub platform: String,
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingContentRecord {
    pub id: i64,
    pub meeting_id: i64,
    pub content_type: ContentType,
    pub platform: Option<SocialPlatform>,
    pub automation_id: Option<i64>,
    pub body: String,
    pub publish_status: PublishStatus,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMeetingContent {
    pub meeting_id: i64,
    pub content_type: ContentType,
    pub platform: Option<SocialPlatform>,
    pub automation_id: Option<i64>,
    pub body: String,
}

/// Outcome of an insert-if-absent keyed on a unique column.
#[derive(Debug, Clone)]
pub enum Inserted<T> {
    Created(T),
    Existing(T),
}

impl<T> Inserted<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Existing(value) => value,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                <$ty>::parse(text).map_err(|e| FromSqlError::Other(e.into()))
            }
        }
    };
}

sql_text_enum!(BotStatus);
sql_text_enum!(MeetingStatus);
sql_text_enum!(ContentType);
sql_text_enum!(SocialPlatform);
sql_text_enum!(PublishStatus);

pub(crate) fn attendees_to_json(attendees: &[String]) -> Result<String> {
    Ok(serde_json::to_string(attendees)?)
}

pub(crate) fn attendees_from_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
