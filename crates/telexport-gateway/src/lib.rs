// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Telexport tool surface.
//!
//! Adapts the extraction engine to the external tool contract: validates
//! inputs, shapes `content` / `structuredContent` envelopes, maps internal
//! failures to the wire error taxonomy, and serves everything over axum
//! with optional bearer auth. Artifact NDJSON files stream through
//! `GET /v1/exports/:id`.

pub mod auth;
pub mod envelope;
pub mod exports;
pub mod server;
pub mod tools;

pub use auth::AuthConfig;
pub use envelope::{ContentItem, ErrorBody, ToolResponse};
pub use server::{router, start_server, GatewayState, ServerConfig};
pub use tools::{FetchHistoryRequest, ResolveChatRequest, Toolkit, ToolkitConfig};
