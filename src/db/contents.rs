use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use super::schemas::{MeetingContentRecord, NewMeetingContent};
use crate::content::PublishStatus;

pub struct MeetingContentRepository;

impl MeetingContentRepository {
    pub fn insert(conn: &Connection, content: &NewMeetingContent) -> Result<MeetingContentRecord> {
        conn.execute(
            "INSERT INTO meeting_contents (meeting_id, content_type, platform, automation_id, body, publish_status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                content.meeting_id,
                content.content_type,
                content.platform,
                content.automation_id,
                content.body,
                PublishStatus::Draft,
            ],
        )
        .context("Failed to insert meeting content")?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, meeting_id, content_type, platform, automation_id, body, publish_status, created_at \
             FROM meeting_contents WHERE id = ?1",
            params![id],
            map_content,
        )
        .context("Failed to reload meeting content")
    }

    pub fn list_for_meeting(conn: &Connection, meeting_id: i64) -> Result<Vec<MeetingContentRecord>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, meeting_id, content_type, platform, automation_id, body, publish_status, created_at \
                 FROM meeting_contents WHERE meeting_id = ?1 ORDER BY id DESC",
            )
            .context("Failed to prepare meeting contents query")?;

        let contents = stmt
            .query_map(params![meeting_id], map_content)
            .context("Failed to list meeting contents")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map meeting contents")?;

        Ok(contents)
    }
}

fn map_content(row: &Row<'_>) -> rusqlite::Result<MeetingContentRecord> {
    Ok(MeetingContentRecord {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        content_type: row.get(2)?,
        platform: row.get(3)?,
        automation_id: row.get(4)?,
        body: row.get(5)?,
        publish_status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentType, SocialPlatform};
    use crate::db::meetings::MeetingRepository;
    use crate::db::test_support::{new_meeting, seed_event, setup_db};

    #[test]
    fn test_insert_and_list() {
        let (conn, user_id) = setup_db();
        let event_id = seed_event(&conn, user_id, "evt-1");
        let meeting = MeetingRepository::insert_if_absent(&conn, &new_meeting(user_id, event_id))
            .unwrap()
            .into_inner();

        let email = MeetingContentRepository::insert(
            &conn,
            &NewMeetingContent {
                meeting_id: meeting.id,
                content_type: ContentType::Email,
                platform: None,
                automation_id: None,
                body: "Thanks all".to_string(),
            },
        )
        .unwrap();
        assert_eq!(email.publish_status, PublishStatus::Draft);
        assert!(email.platform.is_none());

        MeetingContentRepository::insert(
            &conn,
            &NewMeetingContent {
                meeting_id: meeting.id,
                content_type: ContentType::SocialPost,
                platform: Some(SocialPlatform::Linkedin),
                automation_id: Some(7),
                body: "We shipped".to_string(),
            },
        )
        .unwrap();

        let contents = MeetingContentRepository::list_for_meeting(&conn, meeting.id).unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].content_type, ContentType::SocialPost);
        assert_eq!(contents[0].platform, Some(SocialPlatform::Linkedin));
        assert_eq!(contents[0].automation_id, Some(7));
    }
}
