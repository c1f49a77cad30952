// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Telexport server.
//!
//! [`TelexportError`] is the single error surfaced across crate boundaries.
//! Every variant maps onto the stable wire taxonomy via [`TelexportError::kind`],
//! which the gateway uses to shape error envelopes without ever leaking
//! provider-specific text.

use thiserror::Error;

/// The primary error type used across Telexport crates.
#[derive(Debug, Error)]
pub enum TelexportError {
    /// Inputs failed schema or semantic checks (bad date, `from > to`,
    /// bad page size, malformed cursor, window-hash mismatch).
    #[error("validation error: {0}")]
    Validation(String),

    /// The resolver could not find the requested entity.
    #[error("chat not found: {input}")]
    ChatNotFound { input: String },

    /// The input parses as a username but violates the username grammar.
    #[error("invalid username: {input}")]
    UsernameInvalid { input: String },

    /// The entity exists but is not publicly accessible.
    #[error("chat is not publicly accessible: {input}")]
    ChannelPrivate { input: String },

    /// The provider demanded a wait beyond the configured budget.
    ///
    /// `cursor` carries a resumable pagination token when the failure
    /// interrupted a traversal that had already emitted messages.
    #[error("rate limited, retry after {retry_after}s")]
    RateLimited {
        retry_after: u64,
        cursor: Option<String>,
    },

    /// Transient transport or provider failure that survived retries.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// An artifact's TTL elapsed (or the URI was never registered).
    #[error("resource expired: {uri}")]
    ResourceExpired { uri: String },

    /// Filesystem errors from the artifact store.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Uncategorized internal failures.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The stable wire taxonomy. These strings are part of the external
/// contract and must not change casually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationError,
    ChatNotFound,
    UsernameInvalid,
    ChannelPrivate,
    RateLimited,
    Unavailable,
    ResourceExpired,
    InternalError,
}

impl ErrorKind {
    /// The wire representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::ChatNotFound => "CHAT_NOT_FOUND",
            ErrorKind::UsernameInvalid => "USERNAME_INVALID",
            ErrorKind::ChannelPrivate => "CHANNEL_PRIVATE",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::Unavailable => "UNAVAILABLE",
            ErrorKind::ResourceExpired => "RESOURCE_EXPIRED",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for the wire envelope.
    pub fn status(&self) -> u16 {
        match self {
            ErrorKind::ValidationError => 400,
            ErrorKind::ChatNotFound => 404,
            ErrorKind::UsernameInvalid => 400,
            ErrorKind::ChannelPrivate => 403,
            ErrorKind::RateLimited => 429,
            ErrorKind::Unavailable => 503,
            ErrorKind::ResourceExpired => 404,
            ErrorKind::InternalError => 500,
        }
    }

    /// Whether a caller may retry the same request unchanged.
    pub fn retryable(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::Unavailable)
    }
}

impl TelexportError {
    /// Classify this error into the wire taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TelexportError::Validation(_) => ErrorKind::ValidationError,
            TelexportError::ChatNotFound { .. } => ErrorKind::ChatNotFound,
            TelexportError::UsernameInvalid { .. } => ErrorKind::UsernameInvalid,
            TelexportError::ChannelPrivate { .. } => ErrorKind::ChannelPrivate,
            TelexportError::RateLimited { .. } => ErrorKind::RateLimited,
            TelexportError::Unavailable { .. } => ErrorKind::Unavailable,
            TelexportError::ResourceExpired { .. } => ErrorKind::ResourceExpired,
            TelexportError::Io(_) | TelexportError::Internal(_) => ErrorKind::InternalError,
        }
    }
}

pub type Result<T> = std::result::Result<T, TelexportError>;
