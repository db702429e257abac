//! Calendar event ingestion helpers: meeting link extraction and platform
//! detection.

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingPlatform {
    Zoom,
    GoogleMeet,
    Teams,
    Webex,
    Unknown,
}

impl MeetingPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zoom => "zoom",
            Self::GoogleMeet => "google_meet",
            Self::Teams => "teams",
            Self::Webex => "webex",
            Self::Unknown => "unknown",
        }
    }
}

/// A meeting link found on a calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingLink {
    pub url: String,
    pub platform: MeetingPlatform,
}

/// Finds video-call links in calendar event fields.
pub struct MeetingLinkDetector {
    patterns: Vec<(MeetingPlatform, Regex)>,
}

impl MeetingLinkDetector {
    pub fn new() -> Result<Self> {
        let patterns = vec![
            (
                MeetingPlatform::Zoom,
                Regex::new(r#"https://(?:[\w-]+\.)?zoom\.us/(?:j|my|w|s)/[^\s<>"']+"#)?,
            ),
            (
                MeetingPlatform::GoogleMeet,
                Regex::new(r"https://meet\.google\.com/[a-z]{3}-[a-z]{4}-[a-z]{3}")?,
            ),
            (
                MeetingPlatform::Teams,
                Regex::new(
                    r#"https://teams\.(?:microsoft|live)\.com/(?:l/meetup-join|meet)/[^\s<>"']+"#,
                )?,
            ),
            (
                MeetingPlatform::Webex,
                Regex::new(r#"https://(?:[\w-]+\.)?webex\.com/[^\s<>"']+"#)?,
            ),
        ];
        Ok(Self { patterns })
    }

    /// Platform of a URL, or `Unknown`.
    pub fn detect_platform(&self, url: &str) -> MeetingPlatform {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(url))
            .map(|(platform, _)| *platform)
            .unwrap_or(MeetingPlatform::Unknown)
    }

    /// Pick the meeting link for an event.
    ///
    /// An explicit conference link always wins. Otherwise the location and
    /// then the description are searched for a known platform's URL.
    pub fn extract(
        &self,
        explicit_link: Option<&str>,
        location: Option<&str>,
        description: Option<&str>,
    ) -> Option<MeetingLink> {
        if let Some(url) = explicit_link.map(str::trim).filter(|url| !url.is_empty()) {
            return Some(MeetingLink {
                url: url.to_string(),
                platform: self.detect_platform(url),
            });
        }

        [location, description]
            .into_iter()
            .flatten()
            .find_map(|text| self.find_in_text(text))
    }

    fn find_in_text(&self, text: &str) -> Option<MeetingLink> {
        self.patterns.iter().find_map(|(platform, re)| {
            re.find(text).map(|m| MeetingLink {
                url: m.as_str().trim_end_matches(['.', ',', ')', ';']).to_string(),
                platform: *platform,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> MeetingLinkDetector {
        MeetingLinkDetector::new().unwrap()
    }

    #[test]
    fn test_detect_platform() {
        let d = detector();
        assert_eq!(d.detect_platform("https://us02web.zoom.us/j/123456789?pwd=abc"), MeetingPlatform::Zoom);
        assert_eq!(d.detect_platform("https://meet.google.com/abc-defg-hij"), MeetingPlatform::GoogleMeet);
        assert_eq!(
            d.detect_platform("https://teams.microsoft.com/l/meetup-join/19%3ameeting_x"),
            MeetingPlatform::Teams
        );
        assert_eq!(d.detect_platform("https://acme.webex.com/meet/ada"), MeetingPlatform::Webex);
        assert_eq!(d.detect_platform("https://example.com/call"), MeetingPlatform::Unknown);
    }

    #[test]
    fn test_explicit_link_wins() {
        let link = detector()
            .extract(
                Some(" https://example.com/room "),
                Some("https://zoom.us/j/1"),
                None,
            )
            .unwrap();
        assert_eq!(link.url, "https://example.com/room");
        assert_eq!(link.platform, MeetingPlatform::Unknown);
    }

    #[test]
    fn test_location_before_description() {
        let link = detector()
            .extract(
                None,
                Some("Room 4 / https://meet.google.com/abc-defg-hij"),
                Some("Join: https://zoom.us/j/999"),
            )
            .unwrap();
        assert_eq!(link.url, "https://meet.google.com/abc-defg-hij");
        assert_eq!(link.platform, MeetingPlatform::GoogleMeet);
    }

    #[test]
    fn test_description_link_trims_punctuation() {
        let link = detector()
            .extract(
                Some(""),
                Some("Office"),
                Some("Agenda attached. Join here (https://zoom.us/j/123456789)."),
            )
            .unwrap();
        assert_eq!(link.url, "https://zoom.us/j/123456789");
        assert_eq!(link.platform, MeetingPlatform::Zoom);
    }

    #[test]
    fn test_no_link() {
        assert!(detector()
            .extract(None, Some("Conference room"), Some("Bring snacks"))
            .is_none());
    }
}
