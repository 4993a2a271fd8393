//! Shapes returned by the chat API and their conversion into archive records.
//!
//! Conversation list (`GET /organizations/{org}/chat_conversations`):
//! ```json
//! [{"uuid": "…", "name": "…", "created_at": "2024-01-01T00:00:00.000000Z",
//!   "updated_at": "…", …}]
//! ```
//!
//! Conversation detail (`…/chat_conversations/{uuid}?tree=True&rendering_mode=messages`):
//! ```json
//! {"uuid": "…", "chat_messages": [{"sender": "human", "created_at": "…",
//!   "content": [{"type": "text", "text": "…"}], …}], …}
//! ```
//!
//! Only the fields below are read; everything else is ignored.

use crate::error::{Error, Result};
use crate::timestamp::format_timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const MESSAGES_KEY: &str = "chat_messages";
pub const DEFAULT_AUTHOR: &str = "unknown";

/// One element of the conversation list. Every key must be present;
/// a `null` name is read as empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawConversation {
    #[serde(deserialize_with = "nullable_string")]
    pub name: String,
    pub uuid: String,
    pub created_at: String,
    pub updated_at: String,
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedConversation {
    pub name: String,
    pub uuid: String,
    pub created_at: String,
    pub updated_at: String,
    /// Day-level grouping key: the date part of the formatted `updated_at`.
    pub bucket: String,
}

impl From<RawConversation> for CleanedConversation {
    fn from(raw: RawConversation) -> Self {
        let updated_at = format_timestamp(&raw.updated_at);
        let bucket = updated_at.chars().take(10).collect();
        Self {
            name: raw.name,
            uuid: raw.uuid,
            created_at: format_timestamp(&raw.created_at),
            updated_at,
            bucket,
        }
    }
}

impl CleanedConversation {
    /// One-line listing used when reporting what was found.
    pub fn summary(&self) -> String {
        let name = if self.name.is_empty() { "(untitled)" } else { self.name.as_str() };
        format!(
            "{} [{}] created {}, updated {}",
            name, self.uuid, self.created_at, self.updated_at
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationBatch {
    /// Uuid of the record with the greatest raw `updated_at`.
    pub most_recent_uuid: Option<String>,
    pub cleaned: Vec<CleanedConversation>,
}

/// Clean a conversation list payload. Records that do not deserialize are
/// logged and skipped; only a payload that is not a list fails.
pub fn transform_conversations(payload: &Value) -> Result<ConversationBatch> {
    let records = payload.as_array().ok_or_else(|| {
        Error::DataShape(format!(
            "expected a list of conversations, got {}",
            json_type(payload)
        ))
    })?;

    let mut batch = ConversationBatch::default();
    // ISO-8601 strings order chronologically, so the raw value is compared.
    let mut latest: Option<String> = None;

    for (idx, record) in records.iter().enumerate() {
        let raw = match RawConversation::deserialize(record) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Skipping conversation #{}: {}", idx, e);
                continue;
            }
        };

        if latest.as_ref().is_none_or(|ts| raw.updated_at > *ts) {
            latest = Some(raw.updated_at.clone());
            batch.most_recent_uuid = Some(raw.uuid.clone());
        }
        batch.cleaned.push(CleanedConversation::from(raw));
    }

    Ok(batch)
}

/// How message content lists with several parts become one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentMode {
    /// Text of the first part only; later parts are dropped.
    #[default]
    FirstPart,
    /// Every part that carries text, separated by a blank line.
    AllParts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRecord {
    pub author: String,
    pub text: String,
    pub timestamp: Option<String>,
}

/// Flatten a conversation detail payload into ordered message records.
/// Missing or odd input yields an empty list rather than an error.
pub fn transform_messages(detail: Option<&Value>, mode: ContentMode) -> Vec<MessageRecord> {
    let Some(detail) = detail else {
        return Vec::new();
    };
    let Some(items) = detail.get(MESSAGES_KEY).and_then(Value::as_array) else {
        log::warn!("Conversation detail has no `{}` list", MESSAGES_KEY);
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| MessageRecord {
            author: item
                .get("sender")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_AUTHOR)
                .to_string(),
            text: extract_text(item.get("content"), mode),
            timestamp: item
                .get("created_at")
                .and_then(Value::as_str)
                .map(format_timestamp),
        })
        .collect()
}

fn extract_text(content: Option<&Value>, mode: ContentMode) -> String {
    let parts = content
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    match mode {
        ContentMode::FirstPart => parts
            .first()
            .and_then(part_text)
            .unwrap_or_default()
            .to_string(),
        ContentMode::AllParts => parts
            .iter()
            .filter_map(part_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn part_text(part: &Value) -> Option<&str> {
    part.get("text").and_then(Value::as_str)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
