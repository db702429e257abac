use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn init_db() -> Result<Connection> {
    let db_path = crate::global::db_file()?;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(&db_path).context("Failed to open database connection")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("Failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS user_settings (
            user_id INTEGER PRIMARY KEY REFERENCES users(id),
            bot_join_minutes_before INTEGER NOT NULL DEFAULT 5,
            auto_record INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .context("Failed to create user_settings table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS calendar_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            calendar_account TEXT,
            external_id TEXT NOT NULL,
            title TEXT NOT NULL,
            start_time TIMESTAMP NOT NULL,
            end_time TIMESTAMP NOT NULL,
            meeting_url TEXT,
            platform TEXT NOT NULL DEFAULT 'unknown',
            recording_enabled INTEGER NOT NULL DEFAULT 0,
            attendees TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, external_id)
        )",
        [],
    )
    .context("Failed to create calendar_events table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_calendar_events_start_time ON calendar_events(start_time)",
        [],
    )
    .context("Failed to create calendar_events start_time index")?;

    // One bot per calendar event; the unique constraint is the idempotency signal.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS bots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            provider_bot_id TEXT NOT NULL UNIQUE,
            user_id INTEGER NOT NULL REFERENCES users(id),
            calendar_event_id INTEGER NOT NULL UNIQUE REFERENCES calendar_events(id),
            meeting_url TEXT NOT NULL,
            join_at TIMESTAMP NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create bots table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bots_status ON bots(status)",
        [],
    )
    .context("Failed to create bots status index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS meetings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            calendar_event_id INTEGER UNIQUE REFERENCES calendar_events(id),
            bot_id INTEGER REFERENCES bots(id),
            title TEXT NOT NULL,
            start_time TIMESTAMP NOT NULL,
            end_time TIMESTAMP NOT NULL,
            platform TEXT NOT NULL DEFAULT 'unknown',
            transcript TEXT,
            attendees TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'scheduled',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create meetings table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meetings_start_time ON meetings(start_time DESC)",
        [],
    )
    .context("Failed to create meetings start_time index")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meetings_bot_id ON meetings(bot_id)",
        [],
    )
    .context("Failed to create meetings bot_id index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS meeting_contents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meeting_id INTEGER NOT NULL REFERENCES meetings(id),
            content_type TEXT NOT NULL,
            platform TEXT,
            automation_id INTEGER,
            body TEXT NOT NULL,
            publish_status TEXT NOT NULL DEFAULT 'draft',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create meeting_contents table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meeting_contents_meeting_id ON meeting_contents(meeting_id)",
        [],
    )
    .context("Failed to create meeting_contents meeting_id index")?;

    Ok(())
}
