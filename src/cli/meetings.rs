use crate::db::{MeetingRecord, SqliteStore};
use anyhow::Result;

use super::args::MeetingsCliArgs;

/// Longest transcript excerpt printed per meeting.
const PREVIEW_CHARS: usize = 100;

pub async fn handle_meetings_command(args: MeetingsCliArgs) -> Result<()> {
    let store = SqliteStore::open_default()?;
    let meetings = store.list_meetings(args.user, args.limit).await?;

    if meetings.is_empty() {
        println!("No meetings found.");
        return Ok(());
    }

    println!("Found {} meeting(s):\n", meetings.len());

    for meeting in meetings {
        println!("ID: {}", meeting.id);
        println!("Title: {}", meeting.title);
        println!("Start: {}", meeting.start_time.to_rfc3339());
        println!("Platform: {}", meeting.platform);
        println!("Status: {}", meeting.status.as_str());
        println!("Transcript: {}", transcript_preview(&meeting));
        println!("---");
    }

    Ok(())
}

fn transcript_preview(meeting: &MeetingRecord) -> String {
    match &meeting.transcript {
        None => "(none yet)".to_string(),
        Some(text) if text.chars().count() > PREVIEW_CHARS => {
            let head: String = text.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        }
        Some(text) => text.clone(),
    }
}
