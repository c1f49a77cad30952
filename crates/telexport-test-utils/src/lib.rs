// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Telexport workspace.
//!
//! Provides a deterministic corpus builder, a scripted mock history
//! provider with fault injection, and a harness that assembles the full
//! extraction pipeline over temp storage. Fast and CI-runnable: no network,
//! no live Telegram session.

pub mod corpus;
pub mod harness;
pub mod mock_provider;

pub use corpus::{channel, public_group, public_user, sequential_messages, text_message};
pub use harness::TestHarness;
pub use mock_provider::MockHistoryProvider;
