// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat resolver: normalize any accepted input form to a canonical
//! [`ChatRef`] and enforce the public-visibility policy.
//!
//! Accepted forms, in precedence order: `@username`, a `t.me` URL (topic
//! segment ignored), a bare username, a signed 64-bit canonical id.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tracing::{debug, warn};

use telexport_core::{
    ChatRef, HistoryProvider, ProviderError, ResolveTarget, Result, TelexportError,
};

use crate::wait::{WaitController, WaitError};

/// Username grammar bounds (letters, digits, underscore).
const USERNAME_MIN: usize = 4;
const USERNAME_MAX: usize = 32;

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn valid_username(s: &str) -> bool {
    (USERNAME_MIN..=USERNAME_MAX).contains(&s.len())
        && s.chars().all(is_username_char)
        && !s.chars().all(|c| c.is_ascii_digit())
}

/// Parse a raw input string into a resolution target.
///
/// Whitespace is trimmed; usernames are lowercased. Inputs that look like a
/// username but violate the grammar fail with `USERNAME_INVALID`; inputs
/// matching no accepted form fail with `VALIDATION_ERROR`.
pub fn parse_chat_input(input: &str) -> Result<ResolveTarget> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TelexportError::Validation(
            "chat identifier must not be empty".into(),
        ));
    }

    // Form 1: @username.
    if let Some(name) = trimmed.strip_prefix('@') {
        if valid_username(name) {
            return Ok(ResolveTarget::Username(name.to_lowercase()));
        }
        return Err(TelexportError::UsernameInvalid {
            input: trimmed.to_string(),
        });
    }

    // Form 2: t.me URL. The optional trailing segment is a forum topic id;
    // it plays no role in resolution.
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        let rest = trimmed
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let mut segments = rest.trim_end_matches('/').split('/');
        let host = segments.next().unwrap_or_default();
        if host != "t.me" && host != "www.t.me" {
            return Err(TelexportError::Validation(format!(
                "unsupported chat URL host: {host}"
            )));
        }
        let name = match segments.next() {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(TelexportError::Validation(
                    "chat URL is missing a username segment".into(),
                ))
            }
        };
        if let Some(extra) = segments.next() {
            if extra.parse::<i64>().is_err() {
                return Err(TelexportError::Validation(format!(
                    "unexpected chat URL segment: {extra}"
                )));
            }
        }
        if valid_username(name) {
            return Ok(ResolveTarget::Username(name.to_lowercase()));
        }
        return Err(TelexportError::UsernameInvalid {
            input: trimmed.to_string(),
        });
    }

    // Form 4 (checked before bare usernames because the username grammar
    // rejects digit-only strings anyway): a raw canonical id.
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(ResolveTarget::Id(id));
    }

    // Form 3: bare username.
    if valid_username(trimmed) {
        return Ok(ResolveTarget::Username(trimmed.to_lowercase()));
    }

    if trimmed.chars().all(is_username_char) {
        // Right alphabet, wrong shape (too short/long).
        return Err(TelexportError::UsernameInvalid {
            input: trimmed.to_string(),
        });
    }

    Err(TelexportError::Validation(format!(
        "unrecognized chat identifier format: {trimmed}"
    )))
}

/// Resolver configuration (from `[history]`).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub cache_enabled: bool,
    pub cache_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            cache_size: 256,
        }
    }
}

/// Normalizes inputs, queries the provider, enforces public visibility.
pub struct ChatResolver {
    provider: Arc<dyn HistoryProvider>,
    wait: WaitController,
    cache: Option<ResolverCache>,
}

impl ChatResolver {
    pub fn new(
        provider: Arc<dyn HistoryProvider>,
        wait: WaitController,
        config: ResolverConfig,
    ) -> Self {
        let cache = config
            .cache_enabled
            .then(|| ResolverCache::new(config.cache_size));
        Self {
            provider,
            wait,
            cache,
        }
    }

    /// Resolve an input string to a canonical public chat descriptor.
    pub async fn resolve(&self, input: &str) -> Result<ChatRef> {
        let target = parse_chat_input(input)?;
        let cache_key = cache_key(&target);

        if let Some(ref cache) = self.cache {
            if let Some(chat) = cache.get(&cache_key) {
                debug!(input, "resolver cache hit");
                return Ok(chat);
            }
        }

        let resolved = self
            .wait
            .invoke(|| self.provider.resolve(&target))
            .await
            .map_err(|e| map_resolve_error(e, input))?;

        // Public-visibility policy: anything reachable without an invite
        // carries a username. Entities without one are rejected here even
        // when the provider could technically read them.
        if resolved.username.is_none() {
            warn!(input, canonical_id = resolved.canonical_id, "entity resolved but not public");
            return Err(TelexportError::ChannelPrivate {
                input: input.trim().to_string(),
            });
        }

        if let Some(ref cache) = self.cache {
            cache.insert(cache_key, resolved.clone());
        }

        Ok(resolved)
    }

    /// Drop any cached descriptor for this input.
    ///
    /// Called when a downstream fetch reports the entity gone or private,
    /// so a stale cache entry cannot keep masking the new state.
    pub fn invalidate(&self, input: &str) {
        if let (Some(cache), Ok(target)) = (self.cache.as_ref(), parse_chat_input(input)) {
            cache.remove(&cache_key(&target));
        }
    }
}

fn cache_key(target: &ResolveTarget) -> String {
    match target {
        ResolveTarget::Username(name) => format!("u:{name}"),
        ResolveTarget::Id(id) => format!("i:{id}"),
    }
}

fn map_resolve_error(error: WaitError, input: &str) -> TelexportError {
    let input = input.trim().to_string();
    match error {
        WaitError::RateLimited { retry_after } => TelexportError::RateLimited {
            retry_after,
            cursor: None,
        },
        WaitError::Unavailable { message } => TelexportError::Unavailable { message },
        WaitError::Fatal(ProviderError::NotFound) => TelexportError::ChatNotFound { input },
        WaitError::Fatal(ProviderError::Private) => TelexportError::ChannelPrivate { input },
        WaitError::Fatal(ProviderError::UsernameInvalid) => {
            TelexportError::UsernameInvalid { input }
        }
        WaitError::Fatal(e) => TelexportError::Internal(e.to_string()),
    }
}

/// Bounded cache of resolved descriptors.
///
/// Shared reads via DashMap; eviction removes the stalest entry when the
/// capacity is reached.
struct ResolverCache {
    entries: DashMap<String, (ChatRef, Instant)>,
    capacity: usize,
}

impl ResolverCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&self, key: &str) -> Option<ChatRef> {
        self.entries.get(key).map(|entry| entry.0.clone())
    }

    fn insert(&self, key: String, chat: ChatRef) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            if let Some(stalest) = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().1)
                .map(|entry| entry.key().clone())
            {
                self.entries.remove(&stalest);
            }
        }
        self.entries.insert(key, (chat, Instant::now()));
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
