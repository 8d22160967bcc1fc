//! JSON-lines transcript format
//!
//! One object per line:
//! {"sender": "Ana", "timestamp": "2024-01-05T15:15:00Z", "text": "hello"}
//! Timestamps may be RFC 3339 (converted to UTC) or naive "YYYY-MM-DD HH:MM[:SS]".

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::{RawMessage, TranscriptFormat};
use crate::error::{AnalysisError, Result};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

#[derive(Deserialize)]
struct LineRecord {
    sender: String,
    timestamp: String,
    #[serde(default)]
    text: String,
}

pub struct JsonLinesFormat;

impl TranscriptFormat for JsonLinesFormat {
    fn id(&self) -> &str {
        "jsonl:Lines"
    }

    fn description(&self) -> &str {
        "JSON lines with sender, timestamp and text fields"
    }

    fn detect(&self, text: &str) -> bool {
        text.lines()
            .find(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str::<LineRecord>(l.trim()).is_ok())
            .unwrap_or(false)
    }

    fn parse(&self, text: &str) -> Result<Vec<RawMessage>> {
        let mut messages = vec![];

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record: LineRecord = serde_json::from_str(line).map_err(|e| {
                AnalysisError::Input(format!("line {}: malformed record: {}", index + 1, e))
            })?;

            let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
                AnalysisError::Input(format!(
                    "line {}: unrecognised timestamp '{}'",
                    index + 1,
                    record.timestamp
                ))
            })?;

            messages.push(RawMessage {
                sender: record.sender,
                timestamp,
                text: record.text,
            });
        }

        Ok(messages)
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let text = r#"
{"sender": "Ana", "timestamp": "2024-01-05T15:15:00+09:00", "text": "hello"}

{"sender": "Ben", "timestamp": "2024-01-05 07:00", "text": "hi @Ana"}
{"sender": "Ana", "timestamp": "2024-01-05 07:01:30"}
"#;
        let format = JsonLinesFormat;
        assert!(format.detect(text));

        let messages = format.parse(text).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].timestamp.to_string(), "2024-01-05 06:15:00");
        assert_eq!(messages[1].text, "hi @Ana");
        assert_eq!(messages[2].text, "");
        assert_eq!(messages[2].timestamp.to_string(), "2024-01-05 07:01:30");
    }

    #[test]
    fn test_malformed_line_names_line_number() {
        let text = "{\"sender\": \"a\", \"timestamp\": \"2024-01-01 10:00\", \"text\": \"x\"}\nnot json\n";
        let err = JsonLinesFormat.parse(text).unwrap_err();
        assert!(matches!(err, AnalysisError::Input(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let text = r#"{"sender": "a", "timestamp": "yesterday", "text": "x"}"#;
        assert!(JsonLinesFormat.parse(text).is_err());
    }
}
