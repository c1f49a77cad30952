// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Telexport extraction engine.
//!
//! Four tightly coupled pieces: the opaque cursor codec, the filter engine,
//! the wait controller that absorbs provider-imposed wait intervals, and the
//! history fetcher that turns anchored provider batches into clean ascending
//! pages. The chat resolver lives here too, since the fetcher and the tool
//! façade both depend on its canonical descriptors.

pub mod cursor;
pub mod fetcher;
pub mod filter;
pub mod resolver;
pub mod wait;

pub use cursor::CursorState;
pub use fetcher::{FetcherConfig, HistoryFetcher};
pub use resolver::{parse_chat_input, ChatResolver, ResolverConfig};
pub use wait::{WaitController, WaitError, WaitPolicy};
