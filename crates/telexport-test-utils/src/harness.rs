// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring the full extraction pipeline over mocks.
//!
//! Each harness owns an isolated temp export directory, a scripted
//! provider, and the assembled resolver / fetcher / toolkit. Tests are
//! independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use telexport_core::{ChatRef, Message, MessageWindow, Page, Result};
use telexport_gateway::{Toolkit, ToolkitConfig};
use telexport_history::{
    ChatResolver, FetcherConfig, HistoryFetcher, ResolverConfig, WaitController, WaitPolicy,
};
use telexport_resource::ArtifactStore;

use crate::mock_provider::MockHistoryProvider;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    provider: MockHistoryProvider,
    fetcher_config: FetcherConfig,
    wait_policy: WaitPolicy,
    resolver_config: ResolverConfig,
    toolkit_config: ToolkitConfig,
    artifact_ttl: Duration,
}

impl TestHarnessBuilder {
    /// Register a chat and (optionally) its history.
    pub fn with_chat(mut self, chat: ChatRef, history: Vec<Message>) -> Self {
        let id = chat.canonical_id;
        self.provider.add_chat(chat);
        self.provider.add_history(id, history);
        self
    }

    /// Replace the fetcher limits.
    pub fn with_fetcher_config(mut self, config: FetcherConfig) -> Self {
        self.fetcher_config = config;
        self
    }

    /// Replace the wait policy. Tests usually shrink backoffs to
    /// milliseconds here.
    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    /// Enable the resolver cache.
    pub fn with_resolver_cache(mut self, size: usize) -> Self {
        self.resolver_config = ResolverConfig {
            cache_enabled: true,
            cache_size: size,
        };
        self
    }

    /// Make every `n`-th provider batch repeat its last message.
    pub fn with_duplicates_every(mut self, n: usize) -> Self {
        self.provider.set_duplicate_every(n);
        self
    }

    /// Shrink the artifact TTL (default one hour).
    pub fn with_artifact_ttl(mut self, ttl: Duration) -> Self {
        self.artifact_ttl = ttl;
        self
    }

    pub async fn build(self) -> Result<TestHarness> {
        let tempdir = tempfile::tempdir()?;
        let store = Arc::new(ArtifactStore::open(tempdir.path(), self.artifact_ttl).await?);
        let provider = Arc::new(self.provider);
        let wait = WaitController::new(self.wait_policy);

        let resolver = Arc::new(ChatResolver::new(
            provider.clone(),
            wait.clone(),
            self.resolver_config,
        ));
        let max_page_size = self.fetcher_config.max_page_size;
        let fetcher = Arc::new(HistoryFetcher::new(
            provider.clone(),
            wait,
            store.clone(),
            self.fetcher_config,
        ));
        let toolkit = Arc::new(Toolkit::new(
            resolver.clone(),
            fetcher.clone(),
            ToolkitConfig {
                max_page_size,
                ..self.toolkit_config
            },
        ));

        Ok(TestHarness {
            provider,
            resolver,
            fetcher,
            store,
            toolkit,
            _tempdir: tempdir,
        })
    }
}

/// A fully wired pipeline over the mock provider.
pub struct TestHarness {
    pub provider: Arc<MockHistoryProvider>,
    pub resolver: Arc<ChatResolver>,
    pub fetcher: Arc<HistoryFetcher>,
    pub store: Arc<ArtifactStore>,
    pub toolkit: Arc<Toolkit>,
    _tempdir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder {
            provider: MockHistoryProvider::new(),
            fetcher_config: FetcherConfig::default(),
            wait_policy: WaitPolicy {
                base_backoff: Duration::from_millis(1),
                ..WaitPolicy::default()
            },
            resolver_config: ResolverConfig::default(),
            toolkit_config: ToolkitConfig::default(),
            artifact_ttl: Duration::from_secs(3600),
        }
    }

    /// Drain a window: follow cursors until `has_more == false`, returning
    /// every page in order.
    pub async fn fetch_all_pages(&self, window: &MessageWindow) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.fetcher.fetch(window, cursor.as_deref()).await?;
            let has_more = page.page_info.has_more;
            cursor = page.page_info.cursor.clone();
            pages.push(page);
            if !has_more {
                return Ok(pages);
            }
            assert!(
                pages.len() <= 1000,
                "traversal failed to terminate within 1000 pages"
            );
        }
    }

    /// Drain a window and flatten the messages.
    pub async fn fetch_all_messages(&self, window: &MessageWindow) -> Result<Vec<Message>> {
        Ok(self
            .fetch_all_pages(window)
            .await?
            .into_iter()
            .flat_map(|p| p.messages)
            .collect())
    }
}
