//! Calendar event persistence.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::schemas::{attendees_from_json, attendees_to_json, CalendarEventRecord, NewCalendarEvent};

const EVENT_COLUMNS: &str = "id, user_id, calendar_account, external_id, title, start_time, \
     end_time, meeting_url, platform, recording_enabled, attendees, created_at, updated_at";

pub struct CalendarEventRepository;

impl CalendarEventRepository {
    /// Insert or refresh an event keyed on `(user_id, external_id)`.
    ///
    /// An event that already has recording enabled keeps it.
    pub fn upsert(conn: &Connection, event: &NewCalendarEvent) -> Result<CalendarEventRecord> {
        conn.execute(
            "INSERT INTO calendar_events (user_id, calendar_account, external_id, title, \
             start_time, end_time, meeting_url, platform, recording_enabled, attendees) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
             ON CONFLICT(user_id, external_id) DO UPDATE SET \
             calendar_account = excluded.calendar_account, \
             title = excluded.title, \
             start_time = excluded.start_time, \
             end_time = excluded.end_time, \
             meeting_url = excluded.meeting_url, \
             platform = excluded.platform, \
             recording_enabled = MAX(recording_enabled, excluded.recording_enabled), \
             attendees = excluded.attendees, \
             updated_at = CURRENT_TIMESTAMP",
            params![
                event.user_id,
                event.calendar_account,
                event.external_id,
                event.title,
                event.start_time,
                event.end_time,
                event.meeting_url,
                event.platform,
                event.recording_enabled,
                attendees_to_json(&event.attendees)?,
            ],
        )
        .context("Failed to upsert calendar event")?;

        let sql = format!(
            "SELECT {} FROM calendar_events WHERE user_id = ?1 AND external_id = ?2",
            EVENT_COLUMNS
        );
        conn.query_row(&sql, params![event.user_id, event.external_id], map_event)
            .context("Failed to reload calendar event")
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<CalendarEventRecord>> {
        let sql = format!("SELECT {} FROM calendar_events WHERE id = ?1", EVENT_COLUMNS);
        conn.query_row(&sql, params![id], map_event)
            .optional()
            .context("Failed to query calendar event")
    }

    /// Events for a user, soonest first.
    pub fn list_for_user(conn: &Connection, user_id: i64, limit: usize) -> Result<Vec<CalendarEventRecord>> {
        let sql = format!(
            "SELECT {} FROM calendar_events WHERE user_id = ?1 ORDER BY start_time ASC, id ASC LIMIT ?2",
            EVENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).context("Failed to prepare events query")?;

        let events = stmt
            .query_map(params![user_id, limit as i64], map_event)
            .context("Failed to list calendar events")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map calendar events")?;

        Ok(events)
    }

    pub fn set_recording_enabled(conn: &Connection, id: i64, enabled: bool) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE calendar_events SET recording_enabled = ?1, updated_at = CURRENT_TIMESTAMP \
                 WHERE id = ?2",
                params![enabled, id],
            )
            .context("Failed to update recording flag")?;
        Ok(changed > 0)
    }
}

fn map_event(row: &Row<'_>) -> rusqlite::Result<CalendarEventRecord> {
    let attendees: String = row.get(10)?;
    Ok(CalendarEventRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        calendar_account: row.get(2)?,
        external_id: row.get(3)?,
        title: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        meeting_url: row.get(7)?,
        platform: row.get(8)?,
        recording_enabled: row.get(9)?,
        attendees: attendees_from_json(&attendees),
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
