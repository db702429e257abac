use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Overrides `provider.api_key` when set.
pub const API_KEY_ENV: &str = "MEETSYNC_PROVIDER_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub scheduler: SchedulerConfig,
    pub bot: BotConfig,
    pub content: ContentConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Transcription backend requested for every bot. `none` disables transcripts.
    pub transcription_provider: String,
    pub request_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub poll_interval_seconds: u64,
    /// Wait after `transcription_completed_at` before fetching.
    pub transcript_quiescence_seconds: u64,
    /// Wait after recording completion when transcription has not reported done.
    pub recording_quiescence_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub display_name_prefix: String,
    pub default_join_minutes_before: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Shell command that receives the transcript on stdin and prints the content.
    /// Env vars: MEETSYNC_MEETING_ID, MEETSYNC_MEETING_TITLE,
    /// MEETSYNC_CONTENT_TYPE, MEETSYNC_PLATFORM
    pub command: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://us-east-1.recall.ai/api/v1".to_string(),
            api_key: None,
            transcription_provider: "meeting_captions".to_string(),
            request_timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 60,
            transcript_quiescence_seconds: 120,
            recording_quiescence_seconds: 300,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            display_name_prefix: "Notetaker".to_string(),
            default_join_minutes_before: 5,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            timeout_seconds: 120,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3780,
        }
    }
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config.with_env_overrides());
        }

        Self::load_from(&config_path).map(Self::with_env_overrides)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.provider.api_key = Some(key);
            }
        }
        self
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
