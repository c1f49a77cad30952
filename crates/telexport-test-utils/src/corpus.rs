// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic message corpus builders for tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use telexport_core::{ChatKind, ChatRef, MediaKind, Message, Sender};

/// A public broadcast channel descriptor.
pub fn channel(canonical_id: i64, username: &str, title: &str) -> ChatRef {
    ChatRef {
        canonical_id,
        kind: ChatKind::Channel,
        username: Some(username.to_string()),
        title: title.to_string(),
        description: None,
        member_count: Some(12_000),
        verified: Some(false),
    }
}

/// A public group descriptor.
pub fn public_group(canonical_id: i64, username: &str, title: &str) -> ChatRef {
    ChatRef {
        canonical_id,
        kind: ChatKind::Group,
        username: Some(username.to_string()),
        title: title.to_string(),
        description: None,
        member_count: Some(340),
        verified: None,
    }
}

/// A user with a public username.
pub fn public_user(canonical_id: i64, username: &str, display: &str) -> ChatRef {
    ChatRef {
        canonical_id,
        kind: ChatKind::User,
        username: Some(username.to_string()),
        title: display.to_string(),
        description: None,
        member_count: None,
        verified: None,
    }
}

/// A plain text message with sensible defaults.
pub fn text_message(id: i64, date: DateTime<Utc>, text: &str) -> Message {
    Message {
        id,
        date,
        text: text.to_string(),
        sender: Some(Sender {
            id: 5000 + (id % 7),
            username: Some(format!("member{}", id % 7)),
            display: Some(format!("Member {}", id % 7)),
            is_bot: Some(false),
            verified: None,
        }),
        views: Some(100 + id),
        forwards: None,
        replies: None,
        reactions: None,
        pinned: false,
        silent: false,
        post: true,
        noforwards: false,
        media_type: MediaKind::Text,
        has_media: false,
        reply_to_id: None,
        topic_id: None,
        edit_date: None,
    }
}

/// Give a message a media classification (and the matching `has_media`).
pub fn with_media(mut message: Message, kind: MediaKind) -> Message {
    message.media_type = kind;
    message.has_media = kind != MediaKind::Text;
    message
}

/// The default corpus epoch used across tests.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

/// `count` messages with consecutive ids starting at `start_id`, spaced
/// `step_secs` apart starting at `start`.
pub fn sequential_messages(
    start_id: i64,
    count: usize,
    start: DateTime<Utc>,
    step_secs: i64,
) -> Vec<Message> {
    (0..count as i64)
        .map(|i| {
            text_message(
                start_id + i,
                start + Duration::seconds(i * step_secs),
                &format!("message {}", start_id + i),
            )
        })
        .collect()
}
