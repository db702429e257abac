use chrono::{Duration, TimeZone, Utc};
use rusqlite::Connection;

use super::events::CalendarEventRepository;
use super::init::migrate;
use super::schemas::{NewCalendarEvent, NewMeeting};
use super::users::UserRepository;

pub fn setup_db() -> (Connection, i64) {
    let conn = Connection::open_in_memory().unwrap();
    migrate(&conn).unwrap();
    let user_id = UserRepository::upsert(&conn, "ada@example.com").unwrap();
    (conn, user_id)
}

pub fn seed_event(conn: &Connection, user_id: i64, external_id: &str) -> i64 {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap();
    CalendarEventRepository::upsert(
        conn,
        &NewCalendarEvent {
            user_id,
            calendar_account: None,
            external_id: external_id.to_string(),
            title: "Weekly sync".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(30),
            meeting_url: Some("https://zoom.us/j/123".to_string()),
            platform: "zoom".to_string(),
            recording_enabled: true,
            attendees: Vec::new(),
        },
    )
    .unwrap()
    .id
}

pub fn new_meeting(user_id: i64, calendar_event_id: i64) -> NewMeeting {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap();
    NewMeeting {
        user_id,
        calendar_event_id,
        title: "Weekly sync".to_string(),
        start_time: start,
        end_time: start + Duration::minutes(30),
        platform: "zoom".to_string(),
        attendees: vec!["bob@example.com".to_string()],
    }
}
