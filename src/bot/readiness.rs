//! Decides when a completed bot's transcript can be fetched, and fetches it.
//!
//! The provider marks recordings and transcripts complete before the
//! transcript endpoints reliably return full content, so readiness waits out a
//! quiescence window after the relevant timestamp.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::status::{BotStatus, MeetingStatus};
use super::transcript::extract_transcript;
use crate::config::SchedulerConfig;
use crate::db::{BotRecord, MeetingRecord, Store};
use crate::provider::{BotProvider, BotSnapshot, TranscriptSource};

/// Waiting periods applied after provider completion timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuiescenceWindows {
    pub after_transcription: Duration,
    pub after_recording: Duration,
}

impl Default for QuiescenceWindows {
    fn default() -> Self {
        Self {
            after_transcription: Duration::seconds(120),
            after_recording: Duration::seconds(300),
        }
    }
}

impl QuiescenceWindows {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            after_transcription: Duration::seconds(config.transcript_quiescence_seconds as i64),
            after_recording: Duration::seconds(config.recording_quiescence_seconds as i64),
        }
    }
}

/// Readiness of a snapshot's transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    NoRecordings,
    /// Bot was created without transcription; no transcript will ever exist.
    TranscriptionDisabled,
    Quiescing { ready_at: DateTime<Utc> },
    Processing,
    Ready { recording_id: Option<String> },
}

/// Pure readiness decision for a bot snapshot at `now`.
pub fn evaluate(snapshot: &BotSnapshot, now: DateTime<Utc>, windows: QuiescenceWindows) -> Readiness {
    let Some(recording) = snapshot.recordings().first() else {
        return Readiness::NoRecordings;
    };

    if snapshot.transcription_disabled() {
        return Readiness::TranscriptionDisabled;
    }

    let ready_at = if let Some(done) = recording.transcription_completed_at {
        done + windows.after_transcription
    } else if let Some(done) = recording.completed_at {
        done + windows.after_recording
    } else {
        return Readiness::Processing;
    };

    if now < ready_at {
        return Readiness::Quiescing { ready_at };
    }

    let recording_id = Some(recording.id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    Readiness::Ready { recording_id }
}

/// Result of one transcript fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Stored,
    NotReady(Readiness),
    /// Snapshot looked ready but no endpoint returned usable text.
    TranscriptMissing,
    Unretrievable,
    /// Preconditions not met: bot not completed, meeting failed, or
    /// transcript already stored.
    Skipped,
}

impl FetchOutcome {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_) | Self::TranscriptMissing)
    }
}

pub struct TranscriptReadinessEvaluator {
    store: Arc<dyn Store>,
    provider: Arc<dyn BotProvider>,
    clock: Arc<dyn Clock>,
    windows: QuiescenceWindows,
}

impl TranscriptReadinessEvaluator {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn BotProvider>,
        clock: Arc<dyn Clock>,
        windows: QuiescenceWindows,
    ) -> Self {
        Self {
            store,
            provider,
            clock,
            windows,
        }
    }

    pub async fn attempt_transcript_fetch(
        &self,
        bot: &BotRecord,
        meeting: &MeetingRecord,
    ) -> Result<FetchOutcome> {
        if bot.status != BotStatus::Completed
            || meeting.transcript.is_some()
            || meeting.status == MeetingStatus::Failed
        {
            return Ok(FetchOutcome::Skipped);
        }

        let snapshot = self.provider.get_bot(&bot.provider_bot_id).await?;
        let readiness = evaluate(&snapshot, self.clock.now(), self.windows);

        let recording_id = match readiness {
            Readiness::Ready { recording_id } => recording_id,
            Readiness::TranscriptionDisabled => {
                warn!(
                    "Bot {} was created without transcription; meeting {} will never receive a transcript",
                    bot.provider_bot_id, meeting.id
                );
                return Ok(FetchOutcome::Unretrievable);
            }
            other => {
                debug!("Transcript for bot {} not ready: {:?}", bot.provider_bot_id, other);
                return Ok(FetchOutcome::NotReady(other));
            }
        };

        let mut candidates = vec![TranscriptSource::Bot(bot.provider_bot_id.clone())];
        if let Some(recording_id) = recording_id {
            candidates.push(TranscriptSource::Recording(recording_id));
        }

        let Some(text) = self.fetch_first_available(&candidates).await else {
            info!(
                "No transcript content yet for bot {} ({} endpoints tried)",
                bot.provider_bot_id,
                candidates.len()
            );
            return Ok(FetchOutcome::TranscriptMissing);
        };

        if self
            .store
            .complete_meeting_with_transcript(meeting.id, &text)
            .await?
        {
            info!(
                "Stored transcript for meeting {} ({} chars)",
                meeting.id,
                text.len()
            );
            Ok(FetchOutcome::Stored)
        } else {
            debug!("Meeting {} already has a transcript", meeting.id);
            Ok(FetchOutcome::Skipped)
        }
    }

    async fn fetch_first_available(&self, candidates: &[TranscriptSource]) -> Option<String> {
        for source in candidates {
            match self.provider.fetch_transcript(source).await {
                Ok(Some(payload)) => match extract_transcript(&payload) {
                    Some(text) => return Some(text),
                    None => debug!("Transcript from {} had no usable text", source.describe()),
                },
                Ok(None) => debug!("No transcript at {}", source.describe()),
                Err(e) => warn!("Transcript fetch from {} failed: {}", source.describe(), e),
            }
        }
        None
    }
}
