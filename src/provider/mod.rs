//! Recording-bot provider abstraction.
//!
//! The provider is a third-party service that joins calls, records them and
//! produces transcripts. Its responses are eventually consistent and vary in
//! shape, so the snapshot types here accept missing fields and camelCase
//! aliases.

pub mod error;
pub mod recall;

pub use error::ProviderError;
pub use recall::RecallProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transcription provider value that disables transcripts entirely.
pub const TRANSCRIPTION_DISABLED: &str = "none";

/// Parameters for dispatching a new bot.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateBotRequest {
    pub meeting_url: String,
    pub join_at: DateTime<Utc>,
    pub bot_name: String,
    pub transcription_provider: String,
}

/// Where a transcript can be requested from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptSource {
    Bot(String),
    Recording(String),
}

impl TranscriptSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Bot(id) => format!("bot {}", id),
            Self::Recording(id) => format!("recording {}", id),
        }
    }
}

/// Point-in-time view of a bot as reported by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "statusChanges")]
    pub status_changes: Vec<StatusChange>,
    #[serde(default)]
    pub recordings: Option<Vec<Recording>>,
    #[serde(default, alias = "transcriptionOptions")]
    pub transcription_options: Option<TranscriptionOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub code: String,
    #[serde(default, alias = "createdAt", alias = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: Option<RecordingState>,
    #[serde(default, alias = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "transcriptionStartedAt")]
    pub transcription_started_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "transcriptionCompletedAt")]
    pub transcription_completed_at: Option<DateTime<Utc>>,
}

/// Recording status arrives either as a bare code or as `{ "code": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordingState {
    Code(String),
    Detailed { code: String },
}

impl RecordingState {
    pub fn code(&self) -> &str {
        match self {
            Self::Code(code) | Self::Detailed { code } => code,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionOptions {
    #[serde(default)]
    pub provider: Option<String>,
}

impl BotSnapshot {
    /// Code of the most recent status change. Ties go to the later array entry.
    pub fn latest_status_code(&self) -> Option<&str> {
        self.status_changes
            .iter()
            .max_by_key(|change| change.created_at)
            .map(|change| change.code.as_str())
    }

    /// Recordings, treating a missing array as empty.
    pub fn recordings(&self) -> &[Recording] {
        self.recordings.as_deref().unwrap_or(&[])
    }

    pub fn transcription_disabled(&self) -> bool {
        self.transcription_options
            .as_ref()
            .and_then(|opts| opts.provider.as_deref())
            .map(|provider| provider.eq_ignore_ascii_case(TRANSCRIPTION_DISABLED))
            .unwrap_or(false)
    }
}

/// Client for the recording-bot provider.
#[async_trait]
pub trait BotProvider: Send + Sync {
    /// Dispatch a bot and return the provider's id for it.
    async fn create_bot(&self, request: &CreateBotRequest) -> Result<String, ProviderError>;

    async fn get_bot(&self, provider_bot_id: &str) -> Result<BotSnapshot, ProviderError>;

    /// Raw transcript payload, or `None` when the provider has nothing yet.
    async fn fetch_transcript(
        &self,
        source: &TranscriptSource,
    ) -> Result<Option<Value>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_status_code_uses_timestamp() {
        let snapshot: BotSnapshot = serde_json::from_str(
            r#"{
                "id": "bot-1",
                "status_changes": [
                    {"code": "joining_call", "created_at": "2024-06-01T14:50:00Z"},
                    {"code": "done", "created_at": "2024-06-01T16:00:00Z"},
                    {"code": "in_call_recording", "created_at": "2024-06-01T14:52:00Z"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.latest_status_code(), Some("done"));
    }

    #[test]
    fn test_latest_status_code_tie_prefers_last() {
        let snapshot: BotSnapshot = serde_json::from_str(
            r#"{"statusChanges": [{"code": "ready"}, {"code": "joining_call"}]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.latest_status_code(), Some("joining_call"));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot: BotSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.latest_status_code(), None);
        assert!(snapshot.recordings().is_empty());
        assert!(!snapshot.transcription_disabled());
    }

    #[test]
    fn test_recording_shapes_and_aliases() {
        let snapshot: BotSnapshot = serde_json::from_str(
            r#"{
                "recordings": [
                    {"id": "r1", "status": {"code": "done"}, "completedAt": "2024-06-01T16:00:00Z"},
                    {"id": "r2", "status": "processing", "transcription_completed_at": null}
                ],
                "transcription_options": {"provider": "None"}
            }"#,
        )
        .unwrap();

        let recordings = snapshot.recordings();
        assert_eq!(recordings.len(), 2);
        assert_eq!(recordings[0].status.as_ref().unwrap().code(), "done");
        assert!(recordings[0].completed_at.is_some());
        assert_eq!(recordings[1].status.as_ref().unwrap().code(), "processing");
        assert!(recordings[1].transcription_completed_at.is_none());
        assert!(snapshot.transcription_disabled());
    }

    #[test]
    fn test_transcript_source_describe() {
        assert_eq!(TranscriptSource::Bot("b1".into()).describe(), "bot b1");
        assert_eq!(
            TranscriptSource::Recording("r1".into()).describe(),
            "recording r1"
        );
    }
}
