//! Bot record persistence.
//!
//! Raw SQL with rusqlite, same as the other repositories. Inserts are
//! compare-and-create on `calendar_event_id`.

use anyhow::{bail, Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::meetings::MeetingRepository;
use super::schemas::{BotRecord, Inserted, NewBot};
use crate::bot::status::{BotStatus, MeetingStatus};

const BOT_COLUMNS: &str =
    "id, provider_bot_id, user_id, calendar_event_id, meeting_url, join_at, status, created_at, updated_at";

pub struct BotRepository;

impl BotRepository {
    /// Insert a `scheduled` bot unless the event already has one.
    pub fn insert_if_absent(conn: &Connection, bot: &NewBot) -> Result<Inserted<BotRecord>> {
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO bots (provider_bot_id, user_id, calendar_event_id, meeting_url, \
                 join_at, status) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    bot.provider_bot_id,
                    bot.user_id,
                    bot.calendar_event_id,
                    bot.meeting_url,
                    bot.join_at,
                    BotStatus::Scheduled,
                ],
            )
            .context("Failed to insert bot")?;

        match Self::get_by_calendar_event_id(conn, bot.calendar_event_id)? {
            Some(record) if inserted > 0 => Ok(Inserted::Created(record)),
            Some(record) => Ok(Inserted::Existing(record)),
            None => bail!(
                "Bot insert for calendar event {} was ignored but no bot exists",
                bot.calendar_event_id
            ),
        }
    }

    pub fn get_by_calendar_event_id(conn: &Connection, calendar_event_id: i64) -> Result<Option<BotRecord>> {
        let sql = format!("SELECT {} FROM bots WHERE calendar_event_id = ?1", BOT_COLUMNS);
        conn.query_row(&sql, params![calendar_event_id], map_bot)
            .optional()
            .context("Failed to query bot by calendar event")
    }

    pub fn list_by_status(conn: &Connection, statuses: &[BotStatus]) -> Result<Vec<BotRecord>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM bots WHERE status IN ({}) ORDER BY join_at ASC, id ASC",
            BOT_COLUMNS, placeholders
        );
        let mut stmt = conn.prepare(&sql).context("Failed to prepare bots query")?;

        let bots = stmt
            .query_map(params_from_iter(statuses.iter()), map_bot)
            .context("Failed to list bots")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map bots")?;

        Ok(bots)
    }

    /// Completed bots whose meeting still waits for a transcript.
    pub fn list_awaiting_transcript(conn: &Connection) -> Result<Vec<BotRecord>> {
        let mut stmt = conn
            .prepare(
                "SELECT b.id, b.provider_bot_id, b.user_id, b.calendar_event_id, b.meeting_url, \
                 b.join_at, b.status, b.created_at, b.updated_at \
                 FROM bots b JOIN meetings m ON m.bot_id = b.id \
                 WHERE b.status = ?1 AND m.transcript IS NULL AND m.status != ?2 \
                 ORDER BY b.join_at ASC, b.id ASC",
            )
            .context("Failed to prepare pending transcript query")?;

        let bots = stmt
            .query_map(params![BotStatus::Completed, MeetingStatus::Failed], map_bot)
            .context("Failed to list bots awaiting transcript")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map bots")?;

        Ok(bots)
    }

    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<BotRecord>> {
        let sql = format!("SELECT {} FROM bots ORDER BY join_at DESC, id DESC LIMIT ?1", BOT_COLUMNS);
        let mut stmt = conn.prepare(&sql).context("Failed to prepare bots query")?;

        let bots = stmt
            .query_map(params![limit as i64], map_bot)
            .context("Failed to list bots")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map bots")?;

        Ok(bots)
    }

    /// Update status unless the bot is already terminal. Returns whether a row changed.
    pub fn update_status(conn: &Connection, id: i64, status: BotStatus) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE bots SET status = ?1, updated_at = CURRENT_TIMESTAMP \
                 WHERE id = ?2 AND status NOT IN ('completed', 'failed')",
                params![status, id],
            )
            .context("Failed to update bot status")?;
        Ok(changed > 0)
    }

    /// Move the bot to `status` and promote its linked meeting in one
    /// transaction. Returns false, writing nothing, if the bot was terminal.
    pub fn transition(conn: &Connection, id: i64, status: BotStatus) -> Result<bool> {
        let tx = conn
            .unchecked_transaction()
            .context("Failed to begin bot transition")?;

        if !Self::update_status(&tx, id, status)? {
            return Ok(false);
        }
        if let Some(meeting) = MeetingRepository::get_by_bot_id(&tx, id)? {
            if let Some(target) = meeting.status.promote(MeetingStatus::for_bot(status)) {
                MeetingRepository::update_status(&tx, meeting.id, target)?;
            }
        }

        tx.commit().context("Failed to commit bot transition")?;
        Ok(true)
    }
}

fn map_bot(row: &Row<'_>) -> rusqlite::Result<BotRecord> {
    Ok(BotRecord {
        id: row.get(0)?,
        provider_bot_id: row.get(1)?,
        user_id: row.get(2)?,
        calendar_event_id: row.get(3)?,
        meeting_url: row.get(4)?,
        join_at: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
