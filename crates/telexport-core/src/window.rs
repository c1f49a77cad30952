// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message windows and content filters.
//!
//! A [`MessageWindow`] is the immutable description of one fetch: the chat,
//! the optional UTC bounds, direction, page size, and filtering. Its
//! [`window_hash`](MessageWindow::window_hash) is a short digest embedded in
//! cursors so a cursor issued for one window cannot silently be replayed
//! against another.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, TelexportError};
use crate::types::{ChatRef, Direction, MediaKind};

/// Content filter options. Absent fields impose no constraint; present
/// fields are AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryFilter {
    /// Pass iff the message's classified media kind is in the set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_types: Option<BTreeSet<MediaKind>>,
    /// Pass iff `has_media` equals the given value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_media: Option<bool>,
    /// Pass iff the sender id is in the set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_users: Option<BTreeSet<i64>>,
    /// Pass iff `views ?? 0 >= min_views`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_views: Option<i64>,
    /// Pass iff `views ?? 0 <= max_views`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_views: Option<i64>,
}

impl HistoryFilter {
    /// Whether every field is absent.
    pub fn is_empty(&self) -> bool {
        self.media_types.is_none()
            && self.has_media.is_none()
            && self.from_users.is_none()
            && self.min_views.is_none()
            && self.max_views.is_none()
    }
}

/// The requested slice of a chat's history. Immutable per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWindow {
    pub chat: ChatRef,
    pub from_utc: Option<DateTime<Utc>>,
    pub to_utc: Option<DateTime<Utc>>,
    pub direction: Direction,
    pub page_size: usize,
    pub search: Option<String>,
    pub filter: Option<HistoryFilter>,
}

impl MessageWindow {
    /// Validate the window's semantic constraints.
    ///
    /// `max_page_size` is the configured upper bound (at most 100).
    pub fn validate(&self, max_page_size: usize) -> Result<()> {
        if self.page_size < 1 || self.page_size > max_page_size {
            return Err(TelexportError::Validation(format!(
                "page_size must be within [1, {max_page_size}], got {}",
                self.page_size
            )));
        }
        if let (Some(from), Some(to)) = (self.from_utc, self.to_utc) {
            if from > to {
                return Err(TelexportError::Validation(
                    "from_date must not exceed to_date".into(),
                ));
            }
        }
        if let Some(ref filter) = self.filter {
            if let (Some(min), Some(max)) = (filter.min_views, filter.max_views) {
                if min > max {
                    return Err(TelexportError::Validation(
                        "filter.min_views must not exceed filter.max_views".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Short digest of the window parameters, embedded in cursors.
    ///
    /// First 8 bytes of SHA-256 over a canonical rendering, hex encoded.
    /// `page_size` is deliberately excluded: a caller may shrink or grow
    /// pages mid-traversal without invalidating its cursor.
    pub fn window_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.chat.canonical_id.to_le_bytes());
        hasher.update([b'|']);
        hasher.update(
            self.from_utc
                .map(|d| d.timestamp().to_string())
                .unwrap_or_default(),
        );
        hasher.update([b'|']);
        hasher.update(
            self.to_utc
                .map(|d| d.timestamp().to_string())
                .unwrap_or_default(),
        );
        hasher.update([b'|']);
        hasher.update(self.direction.to_string());
        hasher.update([b'|']);
        hasher.update(self.search.as_deref().unwrap_or(""));
        hasher.update([b'|']);
        if let Some(ref filter) = self.filter {
            // BTreeSet fields give a canonical field order for free.
            hasher.update(serde_json::to_vec(filter).unwrap_or_default());
        }
        let digest = hasher.finalize();
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}
