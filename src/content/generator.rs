//! Content generator abstraction and shell command implementation.
//!
//! The generator is an external capability (typically an LLM wrapper
//! script). The shell implementation pipes the transcript to stdin and
//! treats stdout as the generated content.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::{ContentType, SocialPlatform};

/// Environment variable names for meeting metadata passed to the command.
pub mod generator_env {
    pub const MEETING_ID: &str = "MEETSYNC_MEETING_ID";
    pub const MEETING_TITLE: &str = "MEETSYNC_MEETING_TITLE";
    pub const CONTENT_TYPE: &str = "MEETSYNC_CONTENT_TYPE";
    pub const PLATFORM: &str = "MEETSYNC_PLATFORM";
}

/// Input for one generation.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub meeting_id: i64,
    pub title: String,
    pub transcript: String,
    pub content_type: ContentType,
    pub platform: Option<SocialPlatform>,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &ContentRequest) -> Result<String>;
}

/// Runs a shell command per generation.
/// - Pipes the transcript to stdin
/// - Sets environment variables for meeting metadata
/// - Kills the process on timeout
/// - Non-zero exit or empty output is an error
pub struct ShellCommandGenerator {
    command: String,
    timeout: Duration,
}

impl ShellCommandGenerator {
    pub fn new(command: String, timeout_seconds: u64) -> Self {
        Self {
            command,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }
}

#[async_trait]
impl ContentGenerator for ShellCommandGenerator {
    async fn generate(&self, request: &ContentRequest) -> Result<String> {
        if self.command.trim().is_empty() {
            bail!("No content command configured");
        }

        info!(
            "Generating {} for meeting {}: {}",
            request.content_type.as_str(),
            request.meeting_id,
            self.command
        );

        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env(generator_env::MEETING_ID, request.meeting_id.to_string())
            .env(generator_env::MEETING_TITLE, &request.title)
            .env(generator_env::CONTENT_TYPE, request.content_type.as_str())
            .env(
                generator_env::PLATFORM,
                request.platform.map(|p| p.as_str()).unwrap_or(""),
            )
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Feed stdin while draining stdout so neither pipe can fill up and
        // stall the child. Both sit under the timeout; dropping the child on
        // expiry kills it.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(request.transcript.as_bytes()).await {
                    warn!("Failed to write transcript to content command: {}", e);
                }
                // dropping stdin signals EOF
            }
        };
        let run = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result?,
            Err(_) => bail!(
                "Content command timed out after {}s",
                self.timeout.as_secs()
            ),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Content command exited with status {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let content = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if content.is_empty() {
            bail!("Content command produced no output");
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContentRequest {
        ContentRequest {
            meeting_id: 42,
            title: "Standup".to_string(),
            transcript: "Hello world".to_string(),
            content_type: ContentType::SocialPost,
            platform: Some(SocialPlatform::Linkedin),
        }
    }

    #[test]
    fn test_generator_env_constants() {
        assert_eq!(generator_env::MEETING_ID, "MEETSYNC_MEETING_ID");
        assert_eq!(generator_env::CONTENT_TYPE, "MEETSYNC_CONTENT_TYPE");
    }

    #[tokio::test]
    async fn test_stdout_becomes_content() {
        let generator = ShellCommandGenerator::new("cat".to_string(), 10);
        let content = generator.generate(&request()).await.unwrap();
        assert_eq!(content, "Hello world");
    }

    #[tokio::test]
    async fn test_env_vars_exported() {
        let generator = ShellCommandGenerator::new(
            "echo $MEETSYNC_MEETING_ID $MEETSYNC_CONTENT_TYPE $MEETSYNC_PLATFORM".to_string(),
            10,
        );
        let content = generator.generate(&request()).await.unwrap();
        assert_eq!(content, "42 social_post linkedin");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let generator = ShellCommandGenerator::new("exit 3".to_string(), 10);
        assert!(generator.generate(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_output_is_error() {
        let generator = ShellCommandGenerator::new("cat > /dev/null".to_string(), 10);
        assert!(generator.generate(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_large_transcript_round_trips() {
        let generator = ShellCommandGenerator::new("cat".to_string(), 10);
        let transcript = "word ".repeat(100_000);
        let content = generator
            .generate(&ContentRequest {
                transcript: transcript.clone(),
                ..request()
            })
            .await
            .unwrap();
        assert_eq!(content, transcript.trim());
    }

    #[tokio::test]
    async fn test_timeout_applies_when_stdin_is_never_read() {
        let generator = ShellCommandGenerator::new("sleep 30".to_string(), 1);
        let started = std::time::Instant::now();

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            generator.generate(&ContentRequest {
                transcript: "x".repeat(512 * 1024),
                ..request()
            }),
        )
        .await
        .expect("generate should return once its own timeout fires");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unconfigured_command() {
        let generator = ShellCommandGenerator::new(String::new(), 10);
        assert!(generator.generate(&request()).await.is_err());
    }
}
