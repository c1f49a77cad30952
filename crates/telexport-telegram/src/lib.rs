// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MTProto provider adapter built on grammers.
//!
//! Implements [`HistoryProvider`] over a persisted, pre-authorized user
//! session. Entity resolution goes through `contacts.resolveUsername`;
//! history batches go through raw `messages.getHistory` invocations with
//! `add_offset` arithmetic so both scan directions map onto the one wire
//! call. All failures are classified into [`ProviderError`] at this
//! boundary; nothing upstream ever sees a grammers type.

pub mod mapper;

use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use grammers_client::{Client, Config, InitParams};
use grammers_session::Session;
use grammers_tl_types as tl;
use tracing::{debug, info, warn};

use telexport_core::{
    BatchRequest, ChatRef, HistoryProvider, Message, ProviderError, ResolveTarget, Result,
    TelexportError,
};

use mapper::{chat_ref_from_resolved, project_messages};

/// Connection settings for the live provider (from `[telegram]` config).
#[derive(Debug, Clone)]
pub struct TelegramProviderConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub session_path: PathBuf,
}

/// A resolved peer the adapter can address again later.
///
/// MTProto requires an access hash to read a peer; caching every peer we
/// have resolved is what makes numeric-id inputs addressable at all.
#[derive(Clone)]
struct CachedPeer {
    input_peer: tl::enums::InputPeer,
}

/// [`HistoryProvider`] over a grammers MTProto client.
pub struct TelegramProvider {
    client: Client,
    session_path: PathBuf,
    peers: DashMap<i64, CachedPeer>,
}

impl TelegramProvider {
    /// Connect using a persisted session.
    ///
    /// The session must already be authorized; this server never drives a
    /// login flow.
    pub async fn connect(config: TelegramProviderConfig) -> Result<Self> {
        let session = Session::load_file_or_create(&config.session_path)
            .map_err(|e| TelexportError::Internal(format!("failed to load session file: {e}")))?;

        let client = Client::connect(Config {
            session,
            api_id: config.api_id,
            api_hash: config.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .map_err(|e| TelexportError::Unavailable {
            message: format!("telegram connection failed: {e}"),
        })?;

        let authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelexportError::Unavailable {
                message: format!("authorization check failed: {e}"),
            })?;
        if !authorized {
            return Err(TelexportError::Internal(
                "telegram session is not authorized; run the auth flow once before serving"
                    .into(),
            ));
        }

        info!(session = %config.session_path.display(), "telegram provider connected");
        Ok(Self {
            client,
            session_path: config.session_path,
            peers: DashMap::new(),
        })
    }

    /// Persist the session (updated server salts, DC migrations).
    pub fn save_session(&self) -> Result<()> {
        self.client
            .session()
            .save_to_file(&self.session_path)
            .map_err(|e| TelexportError::Internal(format!("failed to save session: {e}")))?;
        Ok(())
    }

    fn cached_input_peer(&self, chat_id: i64) -> Option<tl::enums::InputPeer> {
        self.peers.get(&chat_id).map(|p| p.input_peer.clone())
    }

    async fn resolve_username(&self, username: &str) -> std::result::Result<ChatRef, ProviderError> {
        let request = tl::functions::contacts::ResolveUsername {
            username: username.to_string(),
        };
        let resolved = self
            .client
            .invoke(&request)
            .await
            .map_err(map_invocation_error)?;

        let tl::enums::contacts::ResolvedPeer::Peer(resolved) = resolved;
        let (chat, input_peer) =
            chat_ref_from_resolved(&resolved).ok_or(ProviderError::NotFound)?;

        self.peers
            .insert(chat.canonical_id, CachedPeer { input_peer });
        debug!(
            username,
            canonical_id = chat.canonical_id,
            "peer resolved and cached"
        );
        Ok(chat)
    }
}

#[async_trait]
impl HistoryProvider for TelegramProvider {
    async fn resolve(&self, target: &ResolveTarget) -> std::result::Result<ChatRef, ProviderError> {
        match target {
            ResolveTarget::Username(username) => self.resolve_username(username).await,
            // Ids are only addressable for peers this process has already
            // resolved; MTProto needs the access hash from that resolution.
            ResolveTarget::Id(id) => {
                let peer = self
                    .cached_input_peer(*id)
                    .ok_or(ProviderError::NotFound)?;
                let request = tl::functions::messages::GetHistory {
                    peer: peer.clone(),
                    offset_id: 0,
                    offset_date: 0,
                    add_offset: 0,
                    limit: 1,
                    max_id: 0,
                    min_id: 0,
                    hash: 0,
                };
                // A cheap probe that also refreshes kind/title from the
                // response's entity lists.
                let response = self
                    .client
                    .invoke(&request)
                    .await
                    .map_err(map_invocation_error)?;
                mapper::chat_ref_from_history(*id, &response).ok_or(ProviderError::NotFound)
            }
        }
    }

    async fn fetch_batch(
        &self,
        request: &BatchRequest,
    ) -> std::result::Result<Vec<Message>, ProviderError> {
        // Fetches always follow a resolution, so the peer is in the cache;
        // an unknown id means the caller skipped the resolver.
        let peer = self
            .cached_input_peer(request.chat_id)
            .ok_or(ProviderError::NotFound)?;

        let limit = request.limit.min(100) as i32;
        let anchor = request.anchor_id.unwrap_or(0) as i32;

        // One wire call covers both directions. getHistory walks newest to
        // oldest from an offset position; a negative add_offset shifts the
        // window toward newer messages, which realizes ascending batches.
        let wire = if request.ascending {
            tl::functions::messages::GetHistory {
                peer,
                offset_id: if anchor > 0 { anchor } else { 1 },
                offset_date: match (request.anchor_id, request.anchor_date) {
                    (None, Some(edge)) => edge.timestamp() as i32,
                    _ => 0,
                },
                add_offset: -limit,
                limit,
                max_id: 0,
                min_id: anchor,
                hash: 0,
            }
        } else {
            tl::functions::messages::GetHistory {
                peer,
                offset_id: anchor,
                offset_date: match (request.anchor_id, request.anchor_date) {
                    // +1s makes the edge inclusive; the engine re-checks
                    // the bound on every message anyway.
                    (None, Some(edge)) => (edge.timestamp() + 1) as i32,
                    _ => 0,
                },
                add_offset: 0,
                limit,
                max_id: 0,
                min_id: 0,
                hash: 0,
            }
        };

        let response = self
            .client
            .invoke(&wire)
            .await
            .map_err(map_invocation_error)?;

        let mut messages = project_messages(response);
        if request.ascending {
            messages.reverse();
            // Defensive clamp: the add_offset window can clip at the head
            // of history and hand back messages at or below the anchor.
            if let Some(anchor) = request.anchor_id {
                messages.retain(|m| m.id > anchor);
            }
        }

        debug!(
            chat = request.chat_id,
            count = messages.len(),
            ascending = request.ascending,
            "history batch fetched"
        );
        Ok(messages)
    }
}

/// Classify a grammers invocation failure into the provider taxonomy.
fn map_invocation_error(error: grammers_client::InvocationError) -> ProviderError {
    use grammers_client::InvocationError;

    match error {
        InvocationError::Rpc(rpc) => classify_rpc(&rpc.name, rpc.value, rpc.code as i32),
        other => {
            warn!(error = %other, "transport-level invocation failure");
            ProviderError::Transient {
                message: other.to_string(),
            }
        }
    }
}

/// Pure classification of an RPC error by name/value/code.
fn classify_rpc(name: &str, value: Option<u32>, code: i32) -> ProviderError {
    if name.starts_with("FLOOD_WAIT") || name == "FLOOD_PREMIUM_WAIT" {
        return ProviderError::FloodWait {
            seconds: value.unwrap_or(60) as u64,
        };
    }
    match name {
        "USERNAME_NOT_OCCUPIED" => ProviderError::NotFound,
        "USERNAME_INVALID" => ProviderError::UsernameInvalid,
        "CHANNEL_PRIVATE" | "CHAT_FORBIDDEN" => ProviderError::Private,
        "PEER_ID_INVALID" | "CHANNEL_INVALID" | "CHAT_ID_INVALID" => ProviderError::NotFound,
        "TIMEOUT" => ProviderError::Timeout,
        _ if code >= 500 => ProviderError::Transient {
            message: format!("server error {code}: {name}"),
        },
        _ => ProviderError::Fatal {
            message: format!("rpc error {code}: {name}"),
        },
    }
}
