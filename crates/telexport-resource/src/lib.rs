// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! NDJSON export artifacts with bounded lifetime.
//!
//! Large history windows are materialized as newline-delimited JSON files
//! in a process-private directory, addressed by opaque URIs, and reclaimed
//! by a background sweeper once their TTL elapses.

pub mod store;
pub mod uri;

pub use store::{Artifact, ArtifactReader, ArtifactStore, WindowDescriptor};
pub use uri::{artifact_uri, parse_artifact_uri};
