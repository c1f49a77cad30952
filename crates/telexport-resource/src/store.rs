// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The artifact store: single owner of the export directory.
//!
//! `create` is atomic: content is written to a temp file and renamed into
//! place before the artifact is registered, so a cancelled call leaves
//! either a complete, registered artifact or nothing. Reads take a
//! reference-counted guard that the sweeper honors as a grace period.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter, ReadBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use telexport_core::{Message, Result, TelexportError};

use crate::uri::{artifact_uri, parse_artifact_uri};

/// Identifies the window an artifact was materialized from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDescriptor {
    pub chat_canonical: i64,
    pub window_hash: String,
}

/// Metadata for one NDJSON artifact.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// Opaque artifact id (`export-<16 hex>`).
    pub id: String,
    /// Opaque URI handed to clients.
    pub uri: String,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: u64,
    pub chat_canonical: i64,
    pub window_hash: String,
    pub size_bytes: u64,
    pub message_count: usize,
}

impl Artifact {
    fn expired_at(&self, now: DateTime<Utc>) -> bool {
        let deadline = self.created_at + chrono::Duration::seconds(self.ttl_secs as i64);
        now > deadline
    }
}

struct ArtifactEntry {
    artifact: Artifact,
    readers: Arc<AtomicUsize>,
}

/// Owns the export directory and every artifact in it.
pub struct ArtifactStore {
    dir: PathBuf,
    ttl: Duration,
    entries: DashMap<String, ArtifactEntry>,
}

impl ArtifactStore {
    /// Open (and create if needed) the export directory.
    pub async fn open(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        info!(dir = %dir.display(), ttl_secs = ttl.as_secs(), "artifact store opened");
        Ok(Self {
            dir,
            ttl,
            entries: DashMap::new(),
        })
    }

    /// Serialize `messages` as NDJSON and register the resulting artifact.
    ///
    /// Blocks until the file is fully written; a successful return
    /// guarantees a subsequent `read` observes the complete file.
    pub async fn create(
        &self,
        messages: &[Message],
        descriptor: &WindowDescriptor,
    ) -> Result<Artifact> {
        let id = new_artifact_id();
        let final_path = self.path_for(&id);
        let temp_path = self.dir.join(format!(".{id}.tmp"));

        let write_result = self.write_ndjson(&temp_path, messages).await;
        if let Err(e) = write_result {
            // Never leave a partial temp file behind.
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        tokio::fs::rename(&temp_path, &final_path).await?;
        let size_bytes = tokio::fs::metadata(&final_path).await?.len();

        let artifact = Artifact {
            id: id.clone(),
            uri: artifact_uri(&id),
            created_at: Utc::now(),
            ttl_secs: self.ttl.as_secs(),
            chat_canonical: descriptor.chat_canonical,
            window_hash: descriptor.window_hash.clone(),
            size_bytes,
            message_count: messages.len(),
        };

        self.entries.insert(
            id,
            ArtifactEntry {
                artifact: artifact.clone(),
                readers: Arc::new(AtomicUsize::new(0)),
            },
        );

        debug!(
            uri = artifact.uri.as_str(),
            messages = artifact.message_count,
            bytes = artifact.size_bytes,
            "artifact created"
        );
        Ok(artifact)
    }

    async fn write_ndjson(&self, path: &Path, messages: &[Message]) -> Result<()> {
        let file = tokio::fs::File::create(path).await?;
        let mut writer = BufWriter::new(file);
        for message in messages {
            let line = serde_json::to_vec(message)
                .map_err(|e| TelexportError::Internal(format!("message serialization: {e}")))?;
            writer.write_all(&line).await?;
            writer.write_all(b"\n").await?;
        }
        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(())
    }

    /// Open an artifact for streaming by URI.
    ///
    /// Expired or unknown URIs are a `RESOURCE_EXPIRED` condition; expired
    /// entries are reclaimed eagerly on access.
    pub async fn read(&self, uri: &str) -> Result<ArtifactReader> {
        let id = parse_artifact_uri(uri).ok_or_else(|| TelexportError::ResourceExpired {
            uri: uri.to_string(),
        })?;
        self.read_by_id(id).await
    }

    /// Open an artifact for streaming by bare id.
    pub async fn read_by_id(&self, id: &str) -> Result<ArtifactReader> {
        let (artifact, readers) = {
            let entry = self
                .entries
                .get(id)
                .ok_or_else(|| TelexportError::ResourceExpired {
                    uri: artifact_uri(id),
                })?;
            (entry.artifact.clone(), entry.readers.clone())
        };

        if artifact.expired_at(Utc::now()) {
            drop(self.entries.remove(id));
            let _ = tokio::fs::remove_file(self.path_for(id)).await;
            return Err(TelexportError::ResourceExpired { uri: artifact.uri });
        }

        // Guard before opening so a concurrent sweep cannot reclaim the
        // file between the check and the open.
        readers.fetch_add(1, Ordering::SeqCst);
        let file = match tokio::fs::File::open(self.path_for(id)).await {
            Ok(file) => file,
            Err(e) => {
                readers.fetch_sub(1, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        Ok(ArtifactReader {
            artifact,
            file,
            _guard: ReadGuard { readers },
        })
    }

    /// Look up artifact metadata without opening the file.
    pub fn get(&self, id: &str) -> Option<Artifact> {
        self.entries.get(id).map(|entry| entry.artifact.clone())
    }

    /// Remove every expired artifact without live readers, plus orphaned
    /// files older than the TTL. Returns the number of files removed.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0usize;

        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| {
                entry.artifact.expired_at(now) && entry.readers.load(Ordering::SeqCst) == 0
            })
            .map(|entry| entry.key().clone())
            .collect();

        for id in expired {
            if self.entries.remove(&id).is_some() {
                match tokio::fs::remove_file(self.path_for(&id)).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(id = id.as_str(), error = %e, "failed to remove expired artifact"),
                }
            }
        }

        removed += self.sweep_orphans(now).await;

        if removed > 0 {
            info!(removed, "artifact sweep reclaimed files");
        }
        removed
    }

    /// Remove `.ndjson` files on disk that have no registry entry (from a
    /// previous process) once they are older than the TTL.
    async fn sweep_orphans(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0usize;
        let Ok(mut dir) = tokio::fs::read_dir(&self.dir).await else {
            return 0;
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(id) = name.strip_suffix(".ndjson") else {
                continue;
            };
            if self.entries.contains_key(id) {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = meta.modified() else {
                continue;
            };
            let age = now
                .signed_duration_since(DateTime::<Utc>::from(modified))
                .to_std()
                .unwrap_or_default();
            if age > self.ttl && tokio::fs::remove_file(entry.path()).await.is_ok() {
                debug!(file = name, "removed orphaned artifact file");
                removed += 1;
            }
        }
        removed
    }

    /// Run `sweep` on an interval until the token is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("artifact sweeper stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        store.sweep().await;
                    }
                }
            }
        })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.ndjson"))
    }
}

fn new_artifact_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("export-{}", &hex[..16])
}

/// Decrements the reader count when a streaming read completes.
#[derive(Debug)]
struct ReadGuard {
    readers: Arc<AtomicUsize>,
}

impl Drop for ReadGuard {
    fn drop(&mut self) {
        self.readers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A streaming handle over an artifact file.
///
/// Holds the read guard for its whole lifetime; dropping the reader
/// releases the sweep grace.
#[derive(Debug)]
pub struct ArtifactReader {
    pub artifact: Artifact,
    file: tokio::fs::File,
    _guard: ReadGuard,
}

impl AsyncRead for ArtifactReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use telexport_core::{MediaKind, Message};
    use tokio::io::AsyncReadExt;

    fn message(id: i64) -> Message {
        Message {
            id,
            date: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            text: format!("message {id}"),
            sender: None,
            views: None,
            forwards: None,
            replies: None,
            reactions: None,
            pinned: false,
            silent: false,
            post: false,
            noforwards: false,
            media_type: MediaKind::Text,
            has_media: false,
            reply_to_id: None,
            topic_id: None,
            edit_date: None,
        }
    }

    fn descriptor() -> WindowDescriptor {
        WindowDescriptor {
            chat_canonical: 123,
            window_hash: "a1b2c3d4e5f60718".into(),
        }
    }

    async fn store_with_ttl(ttl: Duration) -> (tempfile::TempDir, Arc<ArtifactStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path(), ttl).await.unwrap();
        (dir, Arc::new(store))
    }

    /// Force an artifact past its deadline without waiting.
    fn backdate(store: &ArtifactStore, id: &str) {
        let mut entry = store.entries.get_mut(id).unwrap();
        entry.artifact.created_at = Utc::now() - chrono::Duration::seconds(10);
        entry.artifact.ttl_secs = 0;
    }

    async fn read_to_string(mut reader: ArtifactReader) -> String {
        let mut buf = String::new();
        reader.read_to_string(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn create_then_read_round_trips_ndjson() {
        let (_dir, store) = store_with_ttl(Duration::from_secs(3600)).await;
        let messages: Vec<Message> = (1..=5).map(message).collect();

        let artifact = store.create(&messages, &descriptor()).await.unwrap();
        assert!(artifact.uri.starts_with("telexport://export/export-"));
        assert_eq!(artifact.message_count, 5);
        assert!(artifact.size_bytes > 0);

        let body = read_to_string(store.read(&artifact.uri).await.unwrap()).await;
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 5);
        for (line, expected_id) in lines.iter().zip(1i64..) {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["id"].as_i64(), Some(expected_id));
        }
        // LF-terminated, no BOM, no enclosing array.
        assert!(body.ends_with('\n'));
        assert!(!body.starts_with('\u{feff}'));
        assert!(!body.starts_with('['));
    }

    #[tokio::test]
    async fn unknown_uri_is_resource_expired() {
        let (_dir, store) = store_with_ttl(Duration::from_secs(3600)).await;
        let err = store
            .read("telexport://export/export-0123456789abcdef.ndjson")
            .await
            .unwrap_err();
        assert!(matches!(err, TelexportError::ResourceExpired { .. }));
    }

    #[tokio::test]
    async fn malformed_uri_is_resource_expired() {
        let (_dir, store) = store_with_ttl(Duration::from_secs(3600)).await;
        let err = store.read("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, TelexportError::ResourceExpired { .. }));
    }

    #[tokio::test]
    async fn expired_artifact_is_rejected_and_reclaimed() {
        let (_dir, store) = store_with_ttl(Duration::from_secs(3600)).await;
        let artifact = store.create(&[message(1)], &descriptor()).await.unwrap();

        backdate(&store, &artifact.id);
        let err = store.read(&artifact.uri).await.unwrap_err();
        assert!(matches!(err, TelexportError::ResourceExpired { .. }));
        assert!(store.get(&artifact.id).is_none());
    }

    #[tokio::test]
    async fn sweep_removes_expired_but_not_fresh() {
        let (_dir, store) = store_with_ttl(Duration::from_secs(3600)).await;
        let expired = store.create(&[message(1)], &descriptor()).await.unwrap();
        let fresh = store.create(&[message(2)], &descriptor()).await.unwrap();

        backdate(&store, &expired.id);
        let removed = store.sweep().await;
        assert_eq!(removed, 1);
        assert!(store.get(&expired.id).is_none());
        assert!(store.read(&fresh.uri).await.is_ok());
    }

    #[tokio::test]
    async fn sweep_spares_artifacts_with_live_readers() {
        let (_dir, store) = store_with_ttl(Duration::from_secs(3600)).await;
        let artifact = store.create(&[message(1)], &descriptor()).await.unwrap();

        let reader = store.read_by_id(&artifact.id).await.unwrap();
        backdate(&store, &artifact.id);

        let removed = store.sweep().await;
        assert_eq!(removed, 0, "sweep must not reclaim under a live reader");
        drop(reader);
        assert_eq!(store.sweep().await, 1);
    }

    #[tokio::test]
    async fn concurrent_creates_get_unique_names() {
        let (_dir, store) = store_with_ttl(Duration::from_secs(3600)).await;
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .create(&[message(i)], &descriptor())
                    .await
                    .unwrap()
                    .id
            }));
        }
        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()), "duplicate artifact id");
        }
    }
}
