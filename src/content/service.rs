use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::{ContentGenerator, ContentRequest, ContentType, SocialPlatform};
use crate::bot::status::MeetingStatus;
use crate::db::{MeetingContentRecord, NewMeetingContent, SqliteStore, Store};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Meeting {0} not found")]
    MeetingNotFound(i64),

    /// Meeting is not completed or has no transcript yet
    #[error("Meeting {0} has no transcript available")]
    TranscriptUnavailable(i64),

    #[error("Content generation failed: {0}")]
    Generator(#[source] anyhow::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Generates and records follow-up content for completed meetings.
pub struct ContentService {
    store: Arc<SqliteStore>,
    generator: Arc<dyn ContentGenerator>,
}

impl ContentService {
    pub fn new(store: Arc<SqliteStore>, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { store, generator }
    }

    pub async fn generate_for_meeting(
        &self,
        meeting_id: i64,
        content_type: ContentType,
        platform: Option<SocialPlatform>,
        automation_id: Option<i64>,
    ) -> Result<MeetingContentRecord, ContentError> {
        let meeting = self
            .store
            .get_meeting(meeting_id)
            .await?
            .ok_or(ContentError::MeetingNotFound(meeting_id))?;

        let transcript = match (&meeting.status, &meeting.transcript) {
            (MeetingStatus::Completed, Some(text)) if !text.trim().is_empty() => text.clone(),
            _ => return Err(ContentError::TranscriptUnavailable(meeting_id)),
        };

        let request = ContentRequest {
            meeting_id,
            title: meeting.title.clone(),
            transcript,
            content_type,
            platform,
        };

        let body = self.generator.generate(&request).await.map_err(|e| {
            warn!("Content generation for meeting {} failed: {}", meeting_id, e);
            ContentError::Generator(e)
        })?;

        let record = self
            .store
            .create_meeting_content(NewMeetingContent {
                meeting_id,
                content_type,
                platform,
                automation_id,
                body,
            })
            .await?;

        info!(
            "Stored {} content {} for meeting {}",
            content_type.as_str(),
            record.id,
            meeting_id
        );
        Ok(record)
    }
}
