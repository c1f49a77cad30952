// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Telexport history export server.
//!
//! This crate provides the shared domain types (chats, messages, pages,
//! windows), the wire error taxonomy, and the `HistoryProvider` trait that
//! abstracts the MTProto client. It contains no I/O; adapters and the
//! extraction engine live in sibling crates.

pub mod error;
pub mod traits;
pub mod types;
pub mod window;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, Result, TelexportError};
pub use traits::provider::{BatchRequest, HistoryProvider, ProviderError, ResolveTarget};
pub use types::{
    classify_media, ChatKind, ChatRef, Direction, ExportInfo, MediaFacets, MediaKind, Message,
    Page, PageInfo, Sender,
};
pub use window::{HistoryFilter, MessageWindow};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_cover_wire_taxonomy() {
        let kinds = [
            ErrorKind::ValidationError,
            ErrorKind::ChatNotFound,
            ErrorKind::UsernameInvalid,
            ErrorKind::ChannelPrivate,
            ErrorKind::RateLimited,
            ErrorKind::Unavailable,
            ErrorKind::ResourceExpired,
            ErrorKind::InternalError,
        ];
        assert_eq!(kinds.len(), 8, "wire taxonomy must have exactly 8 kinds");
        for kind in kinds {
            assert!(!kind.as_str().is_empty());
        }
    }

    #[test]
    fn direction_defaults_to_desc() {
        assert_eq!(Direction::default(), Direction::Desc);
    }
}
