//! Meeting record persistence.
//!
//! CRUD operations for the `meetings` table. Status writes refuse to leave a
//! terminal state and the transcript is written at most once.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::schemas::{attendees_from_json, attendees_to_json, Inserted, MeetingRecord, NewMeeting};
use crate::bot::status::MeetingStatus;

const MEETING_COLUMNS: &str = "id, user_id, calendar_event_id, bot_id, title, start_time, end_time, \
     platform, transcript, attendees, status, created_at, updated_at";

/// Repository for meeting records.
pub struct MeetingRepository;

impl MeetingRepository {
    /// Insert a `scheduled` meeting unless one already exists for the event.
    pub fn insert_if_absent(conn: &Connection, meeting: &NewMeeting) -> Result<Inserted<MeetingRecord>> {
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO meetings (user_id, calendar_event_id, title, start_time, end_time, \
                 platform, attendees, status) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    meeting.user_id,
                    meeting.calendar_event_id,
                    meeting.title,
                    meeting.start_time,
                    meeting.end_time,
                    meeting.platform,
                    attendees_to_json(&meeting.attendees)?,
                    MeetingStatus::Scheduled,
                ],
            )
            .context("Failed to insert meeting")?;

        match Self::get_by_calendar_event_id(conn, meeting.calendar_event_id)? {
            Some(record) if inserted > 0 => Ok(Inserted::Created(record)),
            Some(record) => Ok(Inserted::Existing(record)),
            None => bail!(
                "Meeting insert for calendar event {} was ignored but no meeting exists",
                meeting.calendar_event_id
            ),
        }
    }

    /// Get a meeting by ID.
    pub fn get(conn: &Connection, id: i64) -> Result<Option<MeetingRecord>> {
        let sql = format!("SELECT {} FROM meetings WHERE id = ?1", MEETING_COLUMNS);
        conn.query_row(&sql, params![id], map_meeting)
            .optional()
            .context("Failed to query meeting")
    }

    pub fn get_by_calendar_event_id(conn: &Connection, calendar_event_id: i64) -> Result<Option<MeetingRecord>> {
        let sql = format!("SELECT {} FROM meetings WHERE calendar_event_id = ?1", MEETING_COLUMNS);
        conn.query_row(&sql, params![calendar_event_id], map_meeting)
            .optional()
            .context("Failed to query meeting by calendar event")
    }

    pub fn get_by_bot_id(conn: &Connection, bot_id: i64) -> Result<Option<MeetingRecord>> {
        let sql = format!(
            "SELECT {} FROM meetings WHERE bot_id = ?1 ORDER BY id ASC LIMIT 1",
            MEETING_COLUMNS
        );
        conn.query_row(&sql, params![bot_id], map_meeting)
            .optional()
            .context("Failed to query meeting by bot")
    }

    /// List meetings, newest first, optionally for one user.
    pub fn list(conn: &Connection, user_id: Option<i64>, limit: usize) -> Result<Vec<MeetingRecord>> {
        let sql = format!(
            "SELECT {} FROM meetings WHERE (?1 IS NULL OR user_id = ?1) \
             ORDER BY start_time DESC, id DESC LIMIT ?2",
            MEETING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).context("Failed to prepare meetings list query")?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], map_meeting)
            .context("Failed to list meetings")?;

        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?);
        }

        Ok(meetings)
    }

    pub fn link_bot(conn: &Connection, id: i64, bot_id: i64) -> Result<()> {
        conn.execute(
            "UPDATE meetings SET bot_id = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![bot_id, id],
        )
        .context("Failed to link meeting to bot")?;
        Ok(())
    }

    /// Update the status unless the meeting is already terminal.
    pub fn update_status(conn: &Connection, id: i64, status: MeetingStatus) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE meetings SET status = ?1, updated_at = CURRENT_TIMESTAMP \
                 WHERE id = ?2 AND status NOT IN ('completed', 'failed')",
                params![status, id],
            )
            .context("Failed to update meeting status")?;
        Ok(changed > 0)
    }

    /// Mark meeting as failed, keeping the diagnostic in the transcript column.
    pub fn fail(conn: &Connection, id: i64, diagnostic: &str) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE meetings SET status = ?1, transcript = COALESCE(transcript, ?2), \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE id = ?3 AND status NOT IN ('completed', 'failed')",
                params![MeetingStatus::Failed, diagnostic, id],
            )
            .context("Failed to mark meeting as failed")?;
        Ok(changed > 0)
    }

    /// Store the transcript and mark the meeting completed in one statement.
    ///
    /// Returns false when a transcript is already present.
    pub fn complete_with_transcript(conn: &Connection, id: i64, transcript: &str) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE meetings SET status = ?1, transcript = ?2, updated_at = CURRENT_TIMESTAMP \
                 WHERE id = ?3 AND transcript IS NULL AND status != 'failed'",
                params![MeetingStatus::Completed, transcript, id],
            )
            .context("Failed to store meeting transcript")?;
        Ok(changed > 0)
    }
}

fn map_meeting(row: &Row<'_>) -> rusqlite::Result<MeetingRecord> {
    let attendees: String = row.get(9)?;
    Ok(MeetingRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        calendar_event_id: row.get(2)?,
        bot_id: row.get(3)?,
        title: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        platform: row.get(7)?,
        transcript: row.get(8)?,
        attendees: attendees_from_json(&attendees),
        status: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
