//! Persistence gateway: raw SQL repositories over rusqlite plus the async
//! `Store` seam the bot engine depends on.

pub mod bots;
pub mod contents;
pub mod events;
pub mod init;
pub mod meetings;
pub mod schemas;
pub mod store;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use init::{init_db, migrate};
pub use schemas::{
    BotRecord, CalendarEventRecord, Inserted, MeetingContentRecord, MeetingRecord, NewBot,
    NewCalendarEvent, NewMeeting, NewMeetingContent, UserRecord, UserSettings,
};
pub use store::{SqliteStore, Store};
