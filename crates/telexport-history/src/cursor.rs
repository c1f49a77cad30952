// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque cursor codec.
//!
//! Pagination state is serialized as compact JSON and transported as
//! URL-safe base64 without padding. Clients round-trip the token verbatim;
//! the embedded window hash turns cursor reuse across different windows
//! into a detectable validation error instead of silently wrong data.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use telexport_core::{Direction, Result, TelexportError};

/// Decoded pagination state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    /// Id of the last emitted message (exclusive anchor for the next page).
    pub offset_id: i64,
    /// Epoch seconds of the anchor message, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_date: Option<i64>,
    /// Traversal direction the cursor was issued for.
    pub direction: Direction,
    /// Cumulative messages emitted across the traversal so far.
    pub fetched_count: u64,
    /// Digest of the window parameters this cursor belongs to.
    pub window_hash: String,
}

impl CursorState {
    /// Encode this state as an opaque token.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| TelexportError::Internal(format!("cursor serialization failed: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a token without checking the window hash.
    ///
    /// Any malformed token is a validation error: clients must treat
    /// cursors as opaque, so a token we cannot parse was either corrupted
    /// or not issued by this server.
    pub fn decode(token: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| TelexportError::Validation("cursor is not valid base64".into()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| TelexportError::Validation("cursor payload is malformed".into()))
    }

    /// Decode a token and verify it was issued for the given window hash.
    pub fn decode_for_window(token: &str, window_hash: &str) -> Result<Self> {
        let state = Self::decode(token)?;
        if state.window_hash != window_hash {
            return Err(TelexportError::Validation(
                "cursor was issued for a different query window".into(),
            ));
        }
        Ok(state)
    }
}
