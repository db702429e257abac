use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::{BotProvider, BotSnapshot, CreateBotRequest, ProviderError, TranscriptSource};
use crate::config::ProviderConfig;

/// Request body for dispatching a bot
#[derive(Debug, Serialize)]
struct CreateBotBody<'a> {
    meeting_url: &'a str,
    join_at: String,
    bot_name: &'a str,
    transcription: TranscriptionBody<'a>,
}

#[derive(Debug, Serialize)]
struct TranscriptionBody<'a> {
    provider: &'a str,
}

/// Response from bot creation
#[derive(Debug, Deserialize)]
struct CreateBotResponse {
    id: Option<String>,
}

/// HTTP client for a Recall-style recording bot API.
pub struct RecallProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl RecallProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .context("Failed to build provider HTTP client")?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        info!("Initialized bot provider with base URL: {}", base_url);

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("Token {}", self.api_key))
    }

    /// Send a request and return status plus body text.
    async fn execute(&self, builder: RequestBuilder) -> Result<(StatusCode, String), ProviderError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    fn status_error(status: StatusCode, body: String) -> ProviderError {
        ProviderError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl BotProvider for RecallProvider {
    async fn create_bot(&self, request: &CreateBotRequest) -> Result<String, ProviderError> {
        let body = CreateBotBody {
            meeting_url: &request.meeting_url,
            join_at: request.join_at.to_rfc3339(),
            bot_name: &request.bot_name,
            transcription: TranscriptionBody {
                provider: &request.transcription_provider,
            },
        };

        debug!(
            "Creating bot '{}' for {} at {}",
            request.bot_name, request.meeting_url, body.join_at
        );

        let (status, text) = self
            .execute(self.client.post(self.url("bot/")).json(&body))
            .await?;

        if !status.is_success() {
            error!("Bot creation failed with status {}: {}", status, text);
            return Err(Self::status_error(status, text));
        }

        let created: CreateBotResponse = serde_json::from_str(&text)?;
        let id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingField("id"))?;

        info!("Provider created bot {}", id);
        Ok(id)
    }

    async fn get_bot(&self, provider_bot_id: &str) -> Result<BotSnapshot, ProviderError> {
        let url = self.url(&format!("bot/{}/", provider_bot_id));
        let (status, text) = self.execute(self.client.get(url)).await?;

        if !status.is_success() {
            error!(
                "Bot status request for {} failed with status {}: {}",
                provider_bot_id, status, text
            );
            return Err(Self::status_error(status, text));
        }

        Ok(serde_json::from_str(&text)?)
    }

    async fn fetch_transcript(
        &self,
        source: &TranscriptSource,
    ) -> Result<Option<Value>, ProviderError> {
        let path = match source {
            TranscriptSource::Bot(id) => format!("bot/{}/transcript/", id),
            TranscriptSource::Recording(id) => format!("recording/{}/transcript/", id),
        };

        let (status, text) = self.execute(self.client.get(self.url(&path))).await?;

        if status == StatusCode::NOT_FOUND {
            debug!("No transcript yet for {}", source.describe());
            return Ok(None);
        }

        if !status.is_success() {
            error!(
                "Transcript request for {} failed with status {}: {}",
                source.describe(),
                status,
                text
            );
            return Err(Self::status_error(status, text));
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        // Plain-text transcripts are passed through as a JSON string.
        let payload = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn provider(base_url: &str) -> RecallProvider {
        RecallProvider::new(&ProviderConfig {
            base_url: base_url.to_string(),
            api_key: Some("secret".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let provider = provider("https://example.com/api/v1/");
        assert_eq!(provider.url("bot/"), "https://example.com/api/v1/bot/");
    }

    #[test]
    fn test_create_body_serialization() {
        let join_at = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 14, 50, 0).unwrap();
        let body = CreateBotBody {
            meeting_url: "https://zoom.us/j/1",
            join_at: join_at.to_rfc3339(),
            bot_name: "Notetaker: Standup",
            transcription: TranscriptionBody {
                provider: "meeting_captions",
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["join_at"], "2024-06-01T14:50:00+00:00");
        assert_eq!(json["transcription"]["provider"], "meeting_captions");
    }
}
