// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock history provider for deterministic testing.
//!
//! Serves anchored batches from fixed in-memory histories, with a FIFO
//! fault queue (each queued fault fails exactly one provider call) and
//! optional duplicate injection to exercise the fetcher's dedup path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use telexport_core::{
    BatchRequest, ChatRef, HistoryProvider, Message, ProviderError, ResolveTarget,
};

/// A scripted [`HistoryProvider`] over fixed message corpora.
#[derive(Default)]
pub struct MockHistoryProvider {
    chats: HashMap<i64, ChatRef>,
    usernames: HashMap<String, i64>,
    histories: HashMap<i64, Vec<Message>>,
    faults: Mutex<Vec<ProviderError>>,
    batch_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    /// When set to `n > 0`, every `n`-th batch repeats its last message.
    duplicate_every: usize,
}

impl MockHistoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chat; its username (if any) becomes resolvable.
    pub fn add_chat(&mut self, chat: ChatRef) {
        if let Some(ref username) = chat.username {
            self.usernames
                .insert(username.to_lowercase(), chat.canonical_id);
        }
        self.chats.insert(chat.canonical_id, chat);
    }

    /// Attach a history to a chat id. Kept sorted ascending by id.
    pub fn add_history(&mut self, chat_id: i64, mut messages: Vec<Message>) {
        messages.sort_unstable_by_key(|m| m.id);
        self.histories.insert(chat_id, messages);
    }

    /// Queue a fault; the next provider call consumes and returns it.
    pub fn push_fault(&self, fault: ProviderError) {
        self.faults.lock().unwrap().push(fault);
    }

    /// Make every `n`-th batch repeat its last message.
    pub fn set_duplicate_every(&mut self, n: usize) {
        self.duplicate_every = n;
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    fn take_fault(&self) -> Option<ProviderError> {
        let mut faults = self.faults.lock().unwrap();
        if faults.is_empty() {
            None
        } else {
            Some(faults.remove(0))
        }
    }
}

#[async_trait]
impl HistoryProvider for MockHistoryProvider {
    async fn resolve(&self, target: &ResolveTarget) -> Result<ChatRef, ProviderError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }
        let id = match target {
            ResolveTarget::Username(name) => *self
                .usernames
                .get(&name.to_lowercase())
                .ok_or(ProviderError::NotFound)?,
            ResolveTarget::Id(id) => *id,
        };
        self.chats.get(&id).cloned().ok_or(ProviderError::NotFound)
    }

    async fn fetch_batch(&self, request: &BatchRequest) -> Result<Vec<Message>, ProviderError> {
        let call_index = self.batch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(fault) = self.take_fault() {
            return Err(fault);
        }

        let history = self
            .histories
            .get(&request.chat_id)
            .ok_or(ProviderError::NotFound)?;

        let matches_search = |m: &Message| match request.search {
            Some(ref q) => m.text.to_lowercase().contains(&q.to_lowercase()),
            None => true,
        };

        let mut batch: Vec<Message> = if request.ascending {
            history
                .iter()
                .filter(|m| match request.anchor_id {
                    Some(anchor) => m.id > anchor,
                    None => match request.anchor_date {
                        Some(edge) => m.date >= edge,
                        None => true,
                    },
                })
                .filter(|m| matches_search(m))
                .take(request.limit)
                .cloned()
                .collect()
        } else {
            history
                .iter()
                .rev()
                .filter(|m| match request.anchor_id {
                    Some(anchor) => m.id < anchor,
                    None => match request.anchor_date {
                        Some(edge) => m.date <= edge,
                        None => true,
                    },
                })
                .filter(|m| matches_search(m))
                .take(request.limit)
                .cloned()
                .collect()
        };

        if self.duplicate_every > 0 && call_index % self.duplicate_every == 0 {
            if let Some(last) = batch.last().cloned() {
                batch.push(last);
            }
        }

        Ok(batch)
    }
}
