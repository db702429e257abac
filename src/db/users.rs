//! User and per-user settings persistence.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::schemas::{UserRecord, UserSettings};

pub struct UserRepository;

impl UserRepository {
    /// Insert a user, or return the existing id for the same email.
    pub fn upsert(conn: &Connection, email: &str) -> Result<i64> {
        conn.execute(
            "INSERT OR IGNORE INTO users (email) VALUES (?1)",
            params![email],
        )
        .context("Failed to insert user")?;

        conn.query_row(
            "SELECT id FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .context("Failed to look up user id")
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<UserRecord>> {
        conn.query_row(
            "SELECT id, email, created_at FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .optional()
        .context("Failed to query user")
    }

    /// Settings for a user; users without a row get the defaults.
    pub fn settings(conn: &Connection, user_id: i64) -> Result<UserSettings> {
        let settings = conn
            .query_row(
                "SELECT bot_join_minutes_before, auto_record FROM user_settings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserSettings {
                        bot_join_minutes_before: row.get(0)?,
                        auto_record: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("Failed to query user settings")?;

        Ok(settings.unwrap_or_default())
    }

    pub fn save_settings(conn: &Connection, user_id: i64, settings: &UserSettings) -> Result<()> {
        settings.validate()?;

        conn.execute(
            "INSERT INTO user_settings (user_id, bot_join_minutes_before, auto_record) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id) DO UPDATE SET \
             bot_join_minutes_before = excluded.bot_join_minutes_before, \
             auto_record = excluded.auto_record",
            params![user_id, settings.bot_join_minutes_before, settings.auto_record],
        )
        .context("Failed to save user settings")?;
        Ok(())
    }
}
