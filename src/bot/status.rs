//! Bot and meeting status types and the provider status mapping.
//!
//! Both state machines only move forward. The provider's vocabulary is wider
//! than ours and not contractually fixed, so unknown codes map to nothing.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application-level status of a recording bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotStatus {
    Scheduled,
    Joining,
    Recording,
    Completed,
    Failed,
}

impl BotStatus {
    /// Statuses the scheduler keeps polling.
    pub const ACTIVE: [BotStatus; 3] = [Self::Scheduled, Self::Joining, Self::Recording];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Joining => "joining",
            Self::Recording => "recording",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            // legacy rows written before `joining` existed
            "joining" | "joined" => Ok(Self::Joining),
            "recording" => Ok(Self::Recording),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => anyhow::bail!("Invalid bot status: {}", s),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Scheduled => 0,
            Self::Joining => 1,
            Self::Recording => 2,
            Self::Completed | Self::Failed => 3,
        }
    }

    /// Map a provider status-change code onto a bot status.
    pub fn from_provider_code(code: &str) -> Option<Self> {
        match code {
            "ready" => Some(Self::Scheduled),
            "joining_call" | "in_waiting_room" => Some(Self::Joining),
            "in_call_not_recording" | "in_call_recording" => Some(Self::Recording),
            "call_ended" | "recording_done" | "done" => Some(Self::Completed),
            "failed" | "error" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns the new status if `observed` is strictly ahead of `self`.
    ///
    /// Anything at or behind the current rank is a stale read and yields `None`.
    pub fn advance(self, observed: BotStatus) -> Option<BotStatus> {
        if self.is_terminal() || observed.rank() <= self.rank() {
            return None;
        }
        Some(observed)
    }
}

/// Status of the durable meeting record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    InProgress,
    Completed,
    Failed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => anyhow::bail!("Invalid meeting status: {}", s),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Scheduled => 0,
            Self::InProgress => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// The meeting status implied by a bot status.
    pub fn for_bot(status: BotStatus) -> Self {
        match status {
            BotStatus::Scheduled => Self::Scheduled,
            BotStatus::Joining | BotStatus::Recording => Self::InProgress,
            BotStatus::Completed => Self::Completed,
            BotStatus::Failed => Self::Failed,
        }
    }

    /// Returns `target` if moving there is a promotion, never a regression.
    pub fn promote(self, target: MeetingStatus) -> Option<MeetingStatus> {
        if self.is_terminal() || target.rank() <= self.rank() {
            return None;
        }
        Some(target)
    }
}
