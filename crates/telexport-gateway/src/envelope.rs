// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tool response envelope.
//!
//! Every tool call returns the same shape: a `content` array with at least
//! one text item, a typed `structuredContent` payload, and on failure an
//! `isError` flag plus an `error` object drawn from the wire taxonomy.
//! Provider-specific error text never appears here; only taxonomy codes
//! and neutral detail strings cross the boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use telexport_core::{ChatRef, ErrorKind, TelexportError};

/// One entry of the `content` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub text: String,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            item_type: "text".into(),
            text: text.into(),
        }
    }
}

/// Machine-readable error object in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// The tool response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<ContentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ToolResponse {
    /// A successful response with a text summary and typed payload.
    pub fn success(summary: impl Into<String>, structured: Value) -> Self {
        Self {
            content: vec![ContentItem::text(summary)],
            structured_content: Some(structured),
            is_error: None,
            error: None,
        }
    }

    /// Shape an internal error into the wire envelope.
    pub fn from_error(error: &TelexportError) -> Self {
        let kind = error.kind();
        let (retry_after, cursor) = match error {
            TelexportError::RateLimited {
                retry_after,
                cursor,
            } => (Some(*retry_after), cursor.clone()),
            _ => (None, None),
        };

        // A resumable cursor rides in structuredContent so clients can
        // resubmit it verbatim after the wait.
        let structured_content =
            cursor.map(|c| serde_json::json!({ "cursor": c }));

        Self {
            content: vec![ContentItem::text(summary_for(kind, error))],
            structured_content,
            is_error: Some(true),
            error: Some(ErrorBody {
                error_type: kind.as_str().to_string(),
                title: title_for(kind).to_string(),
                status: kind.status(),
                detail: detail_for(kind, error),
                retry_after,
            }),
        }
    }

    /// HTTP status for this envelope (errors carry their taxonomy status).
    pub fn http_status(&self) -> u16 {
        self.error.as_ref().map(|e| e.status).unwrap_or(200)
    }
}

fn title_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ValidationError => "Validation failed",
        ErrorKind::ChatNotFound => "Chat not found",
        ErrorKind::UsernameInvalid => "Invalid username",
        ErrorKind::ChannelPrivate => "Chat is not public",
        ErrorKind::RateLimited => "Rate limited",
        ErrorKind::Unavailable => "Service unavailable",
        ErrorKind::ResourceExpired => "Resource expired",
        ErrorKind::InternalError => "Internal error",
    }
}

/// Detail string for the error object. Validation and resolution errors
/// carry their own (locally authored) messages; transport and internal
/// failures get a fixed neutral line.
fn detail_for(kind: ErrorKind, error: &TelexportError) -> String {
    match kind {
        ErrorKind::ValidationError
        | ErrorKind::ChatNotFound
        | ErrorKind::UsernameInvalid
        | ErrorKind::ChannelPrivate
        | ErrorKind::ResourceExpired => error.to_string(),
        ErrorKind::RateLimited => match error {
            TelexportError::RateLimited { retry_after, .. } => {
                format!("the provider requires a wait of {retry_after}s before retrying")
            }
            _ => "the provider requires a wait before retrying".to_string(),
        },
        ErrorKind::Unavailable => "the upstream provider is temporarily unavailable".to_string(),
        ErrorKind::InternalError => "an internal error occurred".to_string(),
    }
}

/// Short human summary for `content[0].text`.
fn summary_for(kind: ErrorKind, error: &TelexportError) -> String {
    match error {
        TelexportError::RateLimited { retry_after, .. } => {
            format!("Rate limited. Retry after {retry_after} seconds.")
        }
        _ => format!("{}: {}", title_for(kind), detail_for(kind, error)),
    }
}

/// Project a [`ChatRef`] into the wire shape returned by `resolve_chat`.
///
/// `chat_id` goes out as a string so clients never lose precision on
/// 64-bit ids.
pub fn chat_structured(chat: &ChatRef) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("chat_id".into(), chat.canonical_id.to_string().into());
    obj.insert("kind".into(), chat.kind.to_string().into());
    if let Some(ref username) = chat.username {
        obj.insert("username".into(), username.clone().into());
    }
    obj.insert("title".into(), chat.title.clone().into());
    if let Some(ref description) = chat.description {
        obj.insert("description".into(), description.clone().into());
    }
    if let Some(member_count) = chat.member_count {
        obj.insert("member_count".into(), member_count.into());
    }
    if let Some(verified) = chat.verified {
        obj.insert("verified".into(), verified.into());
    }
    Value::Object(obj)
}
