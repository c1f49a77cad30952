// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Telexport workspace.
//!
//! These are pure data structures: no Telegram wire types appear here.
//! Adapters project provider objects into this shape at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Canonical descriptor for a publicly accessible chat.
///
/// Produced by the resolver and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRef {
    /// Stable integer identifying the chat across the provider.
    pub canonical_id: i64,
    /// Chat classification.
    pub kind: ChatKind,
    /// Public username, without the `@` prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Display title (case-preserving).
    pub title: String,
    /// About/description text, when the provider exposes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Member count, when the provider exposes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<i64>,
    /// Provider-verified badge, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

/// Classification of a chat entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatKind {
    User,
    Group,
    Channel,
}

/// Message sender projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Sender's canonical id.
    pub id: i64,
    /// Public username, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Display name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Whether the sender is a bot account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bot: Option<bool>,
    /// Provider-verified badge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

/// Closed media classification for a message.
///
/// Every message classifies to exactly one kind; text-only messages are
/// [`MediaKind::Text`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Text,
    Photo,
    Video,
    Document,
    Audio,
    Voice,
    Sticker,
    Link,
    Poll,
}

/// Media facets observed on a raw provider message.
///
/// Built at the adapter boundary; classified by [`classify_media`] into a
/// single [`MediaKind`]. Adapters set the `document` facet only for generic
/// documents (a voice note or sticker sets its own facet, not `document`),
/// so the fixed classification order below stays meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaFacets {
    pub photo: bool,
    pub video: bool,
    pub document: bool,
    pub audio: bool,
    pub voice: bool,
    pub sticker: bool,
    pub poll: bool,
    pub link: bool,
}

/// Classify media facets into a single [`MediaKind`].
///
/// Total and deterministic: the first facet present in the fixed order
/// photo, video, document, audio, voice, sticker, poll, link wins;
/// a message with no facets is text.
pub fn classify_media(facets: MediaFacets) -> MediaKind {
    if facets.photo {
        MediaKind::Photo
    } else if facets.video {
        MediaKind::Video
    } else if facets.document {
        MediaKind::Document
    } else if facets.audio {
        MediaKind::Audio
    } else if facets.voice {
        MediaKind::Voice
    } else if facets.sticker {
        MediaKind::Sticker
    } else if facets.poll {
        MediaKind::Poll
    } else if facets.link {
        MediaKind::Link
    } else {
        MediaKind::Text
    }
}

/// A single exported message in the external shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id, unique and monotonic within a chat.
    pub id: i64,
    /// Message timestamp (UTC).
    pub date: DateTime<Utc>,
    /// Text content; empty for media without caption.
    pub text: String,
    /// Sender projection, when the provider exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<Sender>,
    /// View count (channels).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    /// Forward count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwards: Option<i64>,
    /// Reply count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<i64>,
    /// Reaction count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions: Option<i64>,
    /// Message flags.
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub post: bool,
    #[serde(default)]
    pub noforwards: bool,
    /// Classified media kind; `text` for text-only messages.
    pub media_type: MediaKind,
    /// Whether the message carries a media attachment.
    pub has_media: bool,
    /// Id of the message this replies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<i64>,
    /// Forum topic id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<i64>,
    /// Last edit timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<DateTime<Utc>>,
}

/// Scan direction for a traversal.
///
/// Pages are always emitted ascending by id; direction controls which end
/// of the window the traversal starts from and how cursors advance.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

/// Pagination metadata for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether a further page may exist.
    pub has_more: bool,
    /// Opaque token for the next page; `None` when exhausted.
    pub cursor: Option<String>,
    /// Cumulative messages emitted across the traversal, this page included.
    pub total_fetched: u64,
}

/// Reference to an NDJSON export artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    /// Opaque artifact URI.
    pub uri: String,
    /// Serialization format; always `"ndjson"`.
    pub format: String,
}

/// The fetcher's output: one page of messages in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub messages: Vec<Message>,
    pub page_info: PageInfo,
    /// Present when the window was large enough to divert to an artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportInfo>,
}
