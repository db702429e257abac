//! Transcript payload extraction.
//!
//! The provider has shipped several transcript shapes over time. Each probe
//! below recognises one of them; probes run in a fixed order and the first
//! non-empty text wins.

use serde_json::Value;

type Probe = fn(&Value) -> Option<String>;

const PROBES: [(&str, Probe); 7] = [
    ("string", bare_string),
    ("transcript", transcript_field),
    ("text", text_field),
    ("content", content_field),
    ("segments", segment_array),
    ("data", data_string),
    ("data_segments", data_segments),
];

/// Extract plain transcript text from a provider payload.
pub fn extract_transcript(payload: &Value) -> Option<String> {
    PROBES.iter().find_map(|(name, probe)| {
        let text = probe(payload)?;
        tracing::trace!("Transcript matched {} shape", name);
        Some(text)
    })
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn bare_string(value: &Value) -> Option<String> {
    value.as_str().and_then(non_empty)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(bare_string)
}

fn transcript_field(value: &Value) -> Option<String> {
    string_field(value, "transcript")
}

fn text_field(value: &Value) -> Option<String> {
    string_field(value, "text")
}

fn content_field(value: &Value) -> Option<String> {
    string_field(value, "content")
}

fn data_string(value: &Value) -> Option<String> {
    value.get("data").and_then(bare_string)
}

fn data_segments(value: &Value) -> Option<String> {
    value.get("data").and_then(segment_array)
}

fn segment_array(value: &Value) -> Option<String> {
    let parts: Vec<String> = value
        .as_array()?
        .iter()
        .filter_map(segment_text)
        .collect();
    non_empty(&parts.join(" "))
}

/// A segment is a string, `{ "text": .. }`, or `{ "words": [{ "text": .. }] }`.
fn segment_text(segment: &Value) -> Option<String> {
    if let Some(text) = segment.as_str() {
        return non_empty(text);
    }
    if let Some(text) = segment.get("text").and_then(Value::as_str) {
        return non_empty(text);
    }
    let words: Vec<&str> = segment
        .get("words")?
        .as_array()?
        .iter()
        .filter_map(|word| word.get("text").and_then(Value::as_str))
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .collect();
    non_empty(&words.join(" "))
}
