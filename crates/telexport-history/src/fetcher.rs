// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The history fetcher: anchored provider batches in, clean pages out.
//!
//! A call validates its window, decodes the cursor (window-hash checked),
//! then consumes provider batches through the wait controller until the
//! page fills, the window is exhausted, or the per-call scan budget is
//! spent. Pages are emitted in strictly ascending id order, deduplicated,
//! window-bounded, and filtered. Cursor-less calls whose window turns out
//! to be large continue scanning into an NDJSON artifact.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use telexport_core::{
    BatchRequest, Direction, ExportInfo, HistoryProvider, Message, MessageWindow, Page, PageInfo,
    ProviderError, Result, TelexportError,
};
use telexport_resource::{ArtifactStore, WindowDescriptor};

use crate::cursor::CursorState;
use crate::filter;
use crate::wait::{WaitController, WaitError};

/// Fetcher limits (from `[history]` config).
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Upper bound on a caller's `page_size`.
    pub max_page_size: usize,
    /// Raw messages requested per provider batch: `page_size x multiplier`.
    pub inner_read_multiplier: usize,
    /// Maximum provider batches consumed per call.
    pub scan_budget_batches: usize,
    /// Message count above which a window diverts to an artifact.
    pub export_threshold: usize,
    /// Hard cap on messages collected into one artifact.
    pub max_export_messages: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_page_size: 100,
            inner_read_multiplier: 2,
            scan_budget_batches: 8,
            export_threshold: 500,
            max_export_messages: 10_000,
        }
    }
}

/// Why the page-filling scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    /// The page buffer reached `page_size`.
    PageFull,
    /// The provider ran out of messages inside the window.
    Exhausted,
    /// The per-call batch budget was spent before the page filled.
    BudgetSpent,
}

/// Anchor of the traversal: the last message the scan has fully accounted
/// for. `offset_id == 0` in a cursor means "no anchor yet".
#[derive(Debug, Clone, Copy)]
struct Anchor {
    id: i64,
    date: DateTime<Utc>,
}

/// Fetches message history pages over a provider.
pub struct HistoryFetcher {
    provider: Arc<dyn HistoryProvider>,
    wait: WaitController,
    exports: Arc<ArtifactStore>,
    config: FetcherConfig,
}

impl HistoryFetcher {
    pub fn new(
        provider: Arc<dyn HistoryProvider>,
        wait: WaitController,
        exports: Arc<ArtifactStore>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            provider,
            wait,
            exports,
            config,
        }
    }

    /// Fetch one page of the window, resuming from `cursor` if given.
    pub async fn fetch(&self, window: &MessageWindow, cursor: Option<&str>) -> Result<Page> {
        window.validate(self.config.max_page_size)?;
        let window_hash = window.window_hash();

        let state = match cursor {
            Some(token) => Some(CursorState::decode_for_window(token, &window_hash)?),
            None => None,
        };
        let resuming = state.is_some();
        let initial_fetched = state.as_ref().map(|s| s.fetched_count).unwrap_or(0);
        let input_anchor = state.and_then(|s| {
            (s.offset_id != 0).then_some(Anchor {
                id: s.offset_id,
                date: s
                    .offset_date
                    .and_then(|ts| DateTime::from_timestamp(ts, 0))
                    .unwrap_or_default(),
            })
        });

        let mut scan = Scan {
            fetcher: self,
            window,
            seen: HashSet::new(),
            scanned: input_anchor,
            emitted: None,
        };

        let mut page: Vec<Message> = Vec::with_capacity(window.page_size);
        let stop = match scan
            .fill(&mut page, window.page_size, self.config.scan_budget_batches)
            .await
        {
            Ok(stop) => stop,
            Err(ScanError::RateLimited { retry_after }) => {
                // Nothing from this call reaches the client; resumption
                // restarts from the input cursor (or the window edge).
                let resume = self.encode_cursor(
                    window,
                    &window_hash,
                    input_anchor,
                    initial_fetched,
                )?;
                return Err(TelexportError::RateLimited {
                    retry_after,
                    cursor: Some(resume),
                });
            }
            Err(ScanError::Failed(e)) => return Err(e),
        };

        let has_more = stop != StopReason::Exhausted;
        let total_fetched = initial_fetched + page.len() as u64;

        // The next anchor: last emitted message when the page filled,
        // last scanned message when the budget ran out (everything scanned
        // but unemitted was rejected deterministically, so skipping it is
        // gap-free).
        let next_anchor = match stop {
            StopReason::PageFull => scan.emitted,
            StopReason::BudgetSpent => scan.scanned.or(scan.emitted),
            StopReason::Exhausted => None,
        };

        let cursor_token = if has_more {
            Some(self.encode_cursor(window, &window_hash, next_anchor, total_fetched)?)
        } else {
            None
        };

        // Large-window diversion: only on cursor-less calls that still have
        // more to read, so resumed traversals never re-export.
        let export = if !resuming && has_more && !page.is_empty() {
            self.export_overflow(window, &window_hash, &page, &mut scan).await
        } else {
            None
        };

        page.sort_unstable_by_key(|m| m.id);

        debug!(
            chat = window.chat.canonical_id,
            count = page.len(),
            has_more,
            total_fetched,
            exported = export.is_some(),
            "history page assembled"
        );

        Ok(Page {
            messages: page,
            page_info: PageInfo {
                has_more,
                cursor: cursor_token,
                total_fetched,
            },
            export,
        })
    }

    /// Continue the traversal past the inline page; if the window holds
    /// more than `export_threshold` matching messages, materialize all of
    /// them (page included) as an NDJSON artifact.
    ///
    /// Best-effort: any failure here abandons the export and keeps the
    /// inline page intact.
    async fn export_overflow(
        &self,
        window: &MessageWindow,
        window_hash: &str,
        page: &[Message],
        scan: &mut Scan<'_>,
    ) -> Option<ExportInfo> {
        // Rewind to the page boundary: the overflow scan must account for
        // messages the page-filling scan read but did not emit.
        scan.scanned = scan.emitted;

        let cap = self.config.max_export_messages.saturating_sub(page.len());
        let mut overflow: Vec<Message> = Vec::new();
        match scan.fill(&mut overflow, cap, usize::MAX).await {
            Ok(_) => {}
            Err(ScanError::RateLimited { retry_after }) => {
                warn!(retry_after, "rate limited during export scan, returning inline page only");
                return None;
            }
            Err(ScanError::Failed(e)) => {
                warn!(error = %e, "export scan failed, returning inline page only");
                return None;
            }
        }

        let total = page.len() + overflow.len();
        if total <= self.config.export_threshold {
            return None;
        }

        let mut all: Vec<Message> = Vec::with_capacity(total);
        all.extend_from_slice(page);
        all.append(&mut overflow);
        all.sort_unstable_by_key(|m| m.id);

        let descriptor = WindowDescriptor {
            chat_canonical: window.chat.canonical_id,
            window_hash: window_hash.to_string(),
        };
        match self.exports.create(&all, &descriptor).await {
            Ok(artifact) => {
                debug!(uri = artifact.uri.as_str(), count = total, "window exported to artifact");
                Some(ExportInfo {
                    uri: artifact.uri,
                    format: "ndjson".into(),
                })
            }
            Err(e) => {
                warn!(error = %e, "artifact creation failed, returning inline page only");
                None
            }
        }
    }

    fn encode_cursor(
        &self,
        window: &MessageWindow,
        window_hash: &str,
        anchor: Option<Anchor>,
        fetched_count: u64,
    ) -> Result<String> {
        CursorState {
            offset_id: anchor.map(|a| a.id).unwrap_or(0),
            offset_date: anchor.map(|a| a.date.timestamp()),
            direction: window.direction,
            fetched_count,
            window_hash: window_hash.to_string(),
        }
        .encode()
    }

    /// Map a fatal provider error out of a fetch into the wire taxonomy.
    fn map_fetch_error(&self, window: &MessageWindow, error: ProviderError) -> TelexportError {
        let input = window
            .chat
            .username
            .clone()
            .unwrap_or_else(|| window.chat.canonical_id.to_string());
        match error {
            ProviderError::NotFound => TelexportError::ChatNotFound { input },
            ProviderError::Private => TelexportError::ChannelPrivate { input },
            ProviderError::UsernameInvalid => TelexportError::UsernameInvalid { input },
            e => TelexportError::Internal(e.to_string()),
        }
    }
}

/// Scan-internal failure.
enum ScanError {
    RateLimited { retry_after: u64 },
    Failed(TelexportError),
}

/// One call's traversal state, shared between the page-filling scan and
/// the export overflow scan.
struct Scan<'a> {
    fetcher: &'a HistoryFetcher,
    window: &'a MessageWindow,
    /// Ids already accounted for in this call; a page never repeats one.
    seen: HashSet<i64>,
    /// Last message the scan consumed, emitted or not.
    scanned: Option<Anchor>,
    /// Last message appended to an output buffer.
    emitted: Option<Anchor>,
}

impl Scan<'_> {
    /// Consume provider batches until `out` gains `target` messages, the
    /// window is exhausted, or `budget_batches` more batches were used.
    async fn fill(
        &mut self,
        out: &mut Vec<Message>,
        target: usize,
        budget_batches: usize,
    ) -> std::result::Result<StopReason, ScanError> {
        if target == 0 {
            return Ok(StopReason::PageFull);
        }
        let window = self.window;
        let ascending = window.direction == Direction::Asc;
        let batch_limit =
            (window.page_size * self.fetcher.config.inner_read_multiplier).max(1);
        let mut spent_this_fill = 0usize;

        loop {
            if spent_this_fill >= budget_batches {
                return Ok(StopReason::BudgetSpent);
            }
            spent_this_fill += 1;

            let request = BatchRequest {
                chat_id: window.chat.canonical_id,
                limit: batch_limit,
                anchor_id: self.scanned.map(|a| a.id),
                anchor_date: match (self.scanned, ascending) {
                    (Some(_), _) => None,
                    (None, true) => window.from_utc,
                    (None, false) => window.to_utc,
                },
                ascending,
                search: window.search.clone(),
            };

            let batch = self
                .fetcher
                .wait
                .invoke(|| self.fetcher.provider.fetch_batch(&request))
                .await
                .map_err(|e| match e {
                    WaitError::RateLimited { retry_after } => {
                        ScanError::RateLimited { retry_after }
                    }
                    WaitError::Unavailable { message } => {
                        ScanError::Failed(TelexportError::Unavailable { message })
                    }
                    WaitError::Fatal(pe) => {
                        ScanError::Failed(self.fetcher.map_fetch_error(window, pe))
                    }
                })?;

            if batch.is_empty() {
                return Ok(StopReason::Exhausted);
            }

            for message in batch {
                // Window containment. Scan order is monotonic in date, so
                // crossing the far bound ends the traversal.
                if ascending {
                    if let Some(to) = window.to_utc {
                        if message.date > to {
                            return Ok(StopReason::Exhausted);
                        }
                    }
                } else if let Some(from) = window.from_utc {
                    if message.date < from {
                        return Ok(StopReason::Exhausted);
                    }
                }

                // Advance the anchor for everything inside the scan, so a
                // budget-spent cursor always makes forward progress.
                self.scanned = Some(Anchor {
                    id: message.id,
                    date: message.date,
                });

                // Near-bound guard against provider slop.
                if ascending {
                    if let Some(from) = window.from_utc {
                        if message.date < from {
                            continue;
                        }
                    }
                } else if let Some(to) = window.to_utc {
                    if message.date > to {
                        continue;
                    }
                }

                // Duplicates can arise from provider retries.
                if !self.seen.insert(message.id) {
                    continue;
                }

                if let Some(ref f) = window.filter {
                    if !filter::matches(&message, f) {
                        continue;
                    }
                }
                if let Some(ref query) = window.search {
                    if !filter::search_matches(&message, query) {
                        continue;
                    }
                }

                self.emitted = Some(Anchor {
                    id: message.id,
                    date: message.date,
                });
                out.push(message);
                if out.len() >= target {
                    return Ok(StopReason::PageFull);
                }
            }
        }
    }
}
