// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tool façade: `resolve_chat` and `fetch_history`.
//!
//! Owns all transient state for one call. Validates and normalizes inputs
//! (strict-UTC dates, bounded page sizes), delegates to the resolver and
//! fetcher, and shapes every outcome, success or failure, into the tool
//! envelope.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use telexport_core::{
    Direction, HistoryFilter, MessageWindow, Result, TelexportError,
};
use telexport_history::{ChatResolver, HistoryFetcher};

use crate::envelope::{chat_structured, ToolResponse};

/// Arguments for the `resolve_chat` tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveChatRequest {
    /// `@username`, `t.me` URL, bare username, or numeric canonical id.
    pub input: String,
}

/// Arguments for the `fetch_history` tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchHistoryRequest {
    /// Chat identifier in any accepted input form.
    pub chat: String,
    /// Window start, ISO-8601 UTC.
    #[serde(default)]
    pub from_date: Option<String>,
    /// Window end, ISO-8601 UTC.
    #[serde(default)]
    pub to_date: Option<String>,
    /// Messages per page, within `[1, max_page_size]`.
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Opaque cursor from a previous page.
    #[serde(default)]
    pub cursor: Option<String>,
    /// Traversal direction; defaults to `desc`.
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Text search query.
    #[serde(default)]
    pub search: Option<String>,
    /// Content filter options.
    #[serde(default)]
    pub filter: Option<HistoryFilter>,
}

/// Façade configuration.
#[derive(Debug, Clone)]
pub struct ToolkitConfig {
    /// Upper bound on `page_size`.
    pub max_page_size: usize,
    /// Page size used when the caller omits one.
    pub default_page_size: usize,
    /// Upper bound on the length of any raw string input.
    pub max_input_len: usize,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            max_page_size: 100,
            default_page_size: 50,
            max_input_len: 256,
        }
    }
}

/// The tool façade over the extraction engine.
pub struct Toolkit {
    resolver: Arc<ChatResolver>,
    fetcher: Arc<HistoryFetcher>,
    config: ToolkitConfig,
}

impl Toolkit {
    pub fn new(
        resolver: Arc<ChatResolver>,
        fetcher: Arc<HistoryFetcher>,
        config: ToolkitConfig,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            config,
        }
    }

    /// `resolve_chat`: normalize an identifier to a canonical descriptor.
    pub async fn resolve_chat(&self, request: ResolveChatRequest) -> ToolResponse {
        match self.resolve_chat_inner(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "resolve_chat failed");
                ToolResponse::from_error(&e)
            }
        }
    }

    async fn resolve_chat_inner(&self, request: ResolveChatRequest) -> Result<ToolResponse> {
        self.check_input_len("input", &request.input)?;
        let chat = self.resolver.resolve(&request.input).await?;

        info!(
            input = request.input.as_str(),
            canonical_id = chat.canonical_id,
            kind = %chat.kind,
            "chat resolved"
        );

        let summary = match chat.username {
            Some(ref username) => {
                format!("Resolved @{username} to {} \"{}\"", chat.kind, chat.title)
            }
            None => format!("Resolved {} \"{}\"", chat.kind, chat.title),
        };
        Ok(ToolResponse::success(summary, chat_structured(&chat)))
    }

    /// `fetch_history`: one page of a chat's history over a UTC window.
    pub async fn fetch_history(&self, request: FetchHistoryRequest) -> ToolResponse {
        match self.fetch_history_inner(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "fetch_history failed");
                ToolResponse::from_error(&e)
            }
        }
    }

    async fn fetch_history_inner(&self, request: FetchHistoryRequest) -> Result<ToolResponse> {
        self.check_input_len("chat", &request.chat)?;
        if let Some(ref search) = request.search {
            self.check_input_len("search", search)?;
        }

        let from_utc = request
            .from_date
            .as_deref()
            .map(|s| parse_utc_date("from_date", s))
            .transpose()?;
        let to_utc = request
            .to_date
            .as_deref()
            .map(|s| parse_utc_date("to_date", s))
            .transpose()?;

        let page_size = request.page_size.unwrap_or(self.config.default_page_size);
        if page_size < 1 || page_size > self.config.max_page_size {
            return Err(TelexportError::Validation(format!(
                "page_size must be within [1, {}], got {page_size}",
                self.config.max_page_size
            )));
        }

        let chat = self.resolver.resolve(&request.chat).await?;

        let window = MessageWindow {
            chat,
            from_utc,
            to_utc,
            direction: request.direction.unwrap_or_default(),
            page_size,
            search: request.search.clone().filter(|s| !s.trim().is_empty()),
            filter: request.filter.clone().filter(|f| !f.is_empty()),
        };

        let page = match self.fetcher.fetch(&window, request.cursor.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                // A chat that vanished or went private invalidates any
                // cached resolution for it.
                if matches!(
                    e,
                    TelexportError::ChatNotFound { .. } | TelexportError::ChannelPrivate { .. }
                ) {
                    self.resolver.invalidate(&request.chat);
                }
                return Err(e);
            }
        };

        info!(
            chat = window.chat.canonical_id,
            count = page.messages.len(),
            has_more = page.page_info.has_more,
            exported = page.export.is_some(),
            "history page served"
        );

        let mut summary = format!(
            "Fetched {} messages from {}",
            page.messages.len(),
            window
                .chat
                .username
                .as_deref()
                .map(|u| format!("@{u}"))
                .unwrap_or_else(|| window.chat.title.clone())
        );
        if page.page_info.has_more {
            summary.push_str(" (more available via cursor)");
        } else {
            summary.push_str(" (end of results)");
        }
        if let Some(ref export) = page.export {
            summary.push_str(&format!("; full window exported to {}", export.uri));
        }

        let structured = serde_json::to_value(&page)
            .map_err(|e| TelexportError::Internal(format!("page serialization: {e}")))?;
        Ok(ToolResponse::success(summary, structured))
    }

    fn check_input_len(&self, field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(TelexportError::Validation(format!(
                "{field} must not be empty"
            )));
        }
        if value.len() > self.config.max_input_len {
            return Err(TelexportError::Validation(format!(
                "{field} exceeds maximum length of {} bytes",
                self.config.max_input_len
            )));
        }
        Ok(())
    }
}

/// Parse an ISO-8601 date or datetime, enforcing UTC.
///
/// Accepts `YYYY-MM-DD` (midnight UTC) and RFC 3339 datetimes whose offset
/// is `Z` or `+00:00`. Any other offset is a validation error rather than a
/// silent conversion.
pub fn parse_utc_date(field: &str, value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TelexportError::Validation(format!("{field}: invalid date")))?;
        return Ok(DateTime::from_naive_utc_and_offset(midnight, Utc));
    }

    let parsed = DateTime::parse_from_rfc3339(trimmed).map_err(|_| {
        TelexportError::Validation(format!(
            "{field} must be an ISO-8601 UTC datetime (e.g. 2025-06-01T00:00:00Z)"
        ))
    })?;

    if parsed.offset().local_minus_utc() != 0 {
        return Err(TelexportError::Validation(format!(
            "{field} must use a UTC offset (Z or +00:00)"
        )));
    }

    Ok(parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_date_only_as_midnight_utc() {
        let parsed = parse_utc_date("from_date", "2025-06-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_zulu_and_explicit_zero_offset() {
        let zulu = parse_utc_date("from_date", "2025-06-01T12:30:00Z").unwrap();
        let zero = parse_utc_date("from_date", "2025-06-01T12:30:00+00:00").unwrap();
        assert_eq!(zulu, zero);
    }

    #[test]
    fn rejects_non_utc_offsets() {
        let err = parse_utc_date("to_date", "2025-06-01T12:30:00+02:00").unwrap_err();
        assert!(matches!(err, TelexportError::Validation(_)));
    }

    #[test]
    fn rejects_garbage_dates() {
        for bad in ["yesterday", "2025-13-01", "2025-06-01 12:30", ""] {
            assert!(
                parse_utc_date("from_date", bad).is_err(),
                "expected rejection for {bad:?}"
            );
        }
    }
}
