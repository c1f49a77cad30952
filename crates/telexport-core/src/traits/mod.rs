// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the extraction engine and its collaborators.

pub mod provider;

pub use provider::{BatchRequest, HistoryProvider, ProviderError, ResolveTarget};
