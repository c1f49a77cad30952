// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The provider seam: what the extraction engine needs from an MTProto
//! client, and nothing more.
//!
//! The engine never touches wire types. It asks the provider for entity
//! resolution and for *anchored batches* of already-projected messages, and
//! dispatches on [`ProviderError`] structurally: rate limits are data, not
//! control flow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{ChatRef, Message};

/// A parsed resolution target, produced by the resolver's input grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveTarget {
    /// A public username, lowercased, without the `@` prefix.
    Username(String),
    /// A raw canonical id previously returned by the server.
    Id(i64),
}

/// A request for one batch of messages from a chat's history.
///
/// Contract: the provider returns at most `limit` messages strictly beyond
/// the anchor, in scan order:
///
/// - `ascending == true`: ids `> anchor_id`, ordered ascending. With no
///   anchor id, the scan starts at the oldest message at or after
///   `anchor_date` (or the beginning of history).
/// - `ascending == false`: ids `< anchor_id`, ordered descending. With no
///   anchor id, the scan starts at the newest message at or before
///   `anchor_date` (or the head of history).
///
/// An empty batch means the scan is exhausted in that direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// Canonical id of the chat to read.
    pub chat_id: i64,
    /// Maximum messages to return.
    pub limit: usize,
    /// Exclusive anchor id; `None` starts from the window edge.
    pub anchor_id: Option<i64>,
    /// Date edge used when `anchor_id` is absent.
    pub anchor_date: Option<DateTime<Utc>>,
    /// Scan order.
    pub ascending: bool,
    /// Server-side text search query, when the provider supports one.
    pub search: Option<String>,
}

/// Typed failures from the provider, classified for the wait controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider demands a wait before the same call may be retried.
    #[error("flood wait: retry after {seconds}s")]
    FloodWait { seconds: u64 },

    /// The requested entity does not exist.
    #[error("entity not found")]
    NotFound,

    /// The entity exists but is not accessible without an invite.
    #[error("entity is private")]
    Private,

    /// The username is syntactically or semantically invalid upstream.
    #[error("username rejected by provider")]
    UsernameInvalid,

    /// The call exceeded its deadline. Retryable.
    #[error("provider call timed out")]
    Timeout,

    /// Transient transport or server failure. Retryable.
    #[error("transient provider failure: {message}")]
    Transient { message: String },

    /// Non-retryable provider failure.
    #[error("provider failure: {message}")]
    Fatal { message: String },
}

impl ProviderError {
    /// Whether the wait controller should retry this failure with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Timeout | ProviderError::Transient { .. })
    }
}

/// Read-only access to a chat history provider.
///
/// Implementations: the grammers MTProto adapter in `telexport-telegram`,
/// and the scripted mock in `telexport-test-utils`.
#[async_trait]
pub trait HistoryProvider: Send + Sync + 'static {
    /// Resolve a target to a canonical chat descriptor.
    ///
    /// Must not apply the public-visibility policy; the resolver layer
    /// owns that decision.
    async fn resolve(&self, target: &ResolveTarget) -> Result<ChatRef, ProviderError>;

    /// Fetch one anchored batch of projected messages.
    async fn fetch_batch(&self, request: &BatchRequest) -> Result<Vec<Message>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ProviderError::Timeout.is_transient());
        assert!(ProviderError::Transient {
            message: "connection reset".into()
        }
        .is_transient());
        assert!(!ProviderError::FloodWait { seconds: 30 }.is_transient());
        assert!(!ProviderError::NotFound.is_transient());
        assert!(!ProviderError::Private.is_transient());
        assert!(!ProviderError::Fatal {
            message: "boom".into()
        }
        .is_transient());
    }
}
