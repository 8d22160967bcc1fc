//! Transcript formats and the message store
//!
//! Formats:
//! - kakao:Talk  KakaoTalk "export chat" text files (PC and mobile layouts)
//! - jsonl:Lines one JSON object per message

mod jsonl;
mod kakao;

pub use jsonl::JsonLinesFormat;
pub use kakao::KakaoTalkFormat;

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{AnalysisError, Result};

/// A message as produced by a transcript format, before ids are assigned
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub sender: String,
    pub timestamp: NaiveDateTime,
    pub text: String,
}

/// A parsed, immutable chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Position in the original transcript (0-based)
    pub id: u64,
    pub conversation_id: String,
    pub sender_id: String,
    pub timestamp: NaiveDateTime,
    pub raw_text: String,
}

/// Ordered messages of one or more conversations.
///
/// Messages are sorted by timestamp; ties keep transcript order.
#[derive(Debug, Clone)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    /// Build a store for a single conversation from raw transcript messages
    pub fn new(conversation_id: &str, raw: Vec<RawMessage>) -> Self {
        let messages = raw
            .into_iter()
            .enumerate()
            .map(|(position, m)| Message {
                id: position as u64,
                conversation_id: conversation_id.to_string(),
                sender_id: m.sender,
                timestamp: m.timestamp,
                raw_text: m.text,
            })
            .collect();
        Self::from_messages(messages)
    }

    /// Build a store from already-identified messages
    pub fn from_messages(mut messages: Vec<Message>) -> Self {
        // Stable: equal timestamps keep their incoming order
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Distinct sender ids in sorted order
    pub fn participants(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|m| m.sender_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct conversation ids in order of first appearance
    pub fn conversations(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = vec![];
        for m in &self.messages {
            if !seen.contains(&m.conversation_id.as_str()) {
                seen.push(&m.conversation_id);
            }
        }
        seen
    }
}

/// A transcript export format
pub trait TranscriptFormat: Send + Sync {
    /// Unique identifier: "{family}:{variant}"
    fn id(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Cheap check whether `text` looks like this format
    fn detect(&self, text: &str) -> bool;

    /// Parse the whole transcript
    fn parse(&self, text: &str) -> Result<Vec<RawMessage>>;
}

/// Registry of known transcript formats
pub struct FormatRegistry {
    formats: Vec<Box<dyn TranscriptFormat>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        let mut registry = Self { formats: vec![] };
        registry.register(Box::new(KakaoTalkFormat::new()));
        registry.register(Box::new(JsonLinesFormat));
        registry
    }

    pub fn register(&mut self, format: Box<dyn TranscriptFormat>) {
        self.formats.push(format);
    }

    pub fn all_formats(&self) -> Vec<&dyn TranscriptFormat> {
        self.formats.iter().map(|f| f.as_ref()).collect()
    }

    /// Look up a format by id, or by its family prefix ("kakao", "jsonl")
    pub fn get_format(&self, id: &str) -> Option<&dyn TranscriptFormat> {
        self.formats
            .iter()
            .find(|f| f.id() == id || f.id().split(':').next() == Some(id))
            .map(|f| f.as_ref())
    }

    /// First registered format whose detection accepts `text`
    pub fn detect(&self, text: &str) -> Option<&dyn TranscriptFormat> {
        self.formats
            .iter()
            .find(|f| f.detect(text))
            .map(|f| f.as_ref())
    }

    /// Parse `text` into a store, using `format` when given or detection otherwise
    pub fn load(
        &self,
        text: &str,
        format: Option<&str>,
        conversation_id: &str,
    ) -> Result<MessageStore> {
        let parser = match format {
            Some(id) => self
                .get_format(id)
                .ok_or_else(|| AnalysisError::Input(format!("Unknown transcript format: {}", id)))?,
            None => self.detect(text).ok_or_else(|| {
                AnalysisError::Input("Could not detect the transcript format".to_string())
            })?,
        };
        tracing::info!(format = parser.id(), "parsing transcript");
        let raw = parser.parse(text)?;
        Ok(MessageStore::new(conversation_id, raw))
    }
}
