//! Follow-up content generated from completed meeting transcripts.
//!
//! Generation itself is delegated to an opaque `ContentGenerator`; this module
//! only gates on meeting readiness and records the result.

pub mod generator;
pub mod service;

pub use generator::{ContentGenerator, ContentRequest, ShellCommandGenerator};
pub use service::{ContentError, ContentService};

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Email,
    SocialPost,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::SocialPost => "social_post",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "email" => Ok(Self::Email),
            "social_post" => Ok(Self::SocialPost),
            _ => anyhow::bail!("Invalid content type: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Linkedin,
    Facebook,
}

impl SocialPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Facebook => "facebook",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "linkedin" => Ok(Self::Linkedin),
            "facebook" => Ok(Self::Facebook),
            _ => anyhow::bail!("Invalid social platform: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Draft,
    Published,
    Failed,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "failed" => Ok(Self::Failed),
            _ => anyhow::bail!("Invalid publish status: {}", s),
        }
    }
}
