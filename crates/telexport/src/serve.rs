// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `telexport serve` and `telexport check` command implementations.
//!
//! Serve wires the whole pipeline: config load + validation, tracing,
//! the live Telegram provider, the artifact store and its sweeper, and
//! the gateway. Shutdown is signal-driven via a cancellation token.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use telexport_config::{
    figment_to_config_errors, render_errors, validate_config, TelexportConfig,
};
use telexport_core::TelexportError;
use telexport_gateway::{
    AuthConfig, GatewayState, ServerConfig, Toolkit, ToolkitConfig,
};
use telexport_history::{
    ChatResolver, FetcherConfig, HistoryFetcher, ResolverConfig, WaitController, WaitPolicy,
};
use telexport_resource::ArtifactStore;
use telexport_telegram::{TelegramProvider, TelegramProviderConfig};

/// Load and validate configuration, rendering diagnostics on failure.
fn load_validated_config(path: Option<&Path>) -> Result<TelexportConfig, TelexportError> {
    let loaded = match path {
        Some(path) => telexport_config::load_config_from_path(path),
        None => telexport_config::load_config(),
    };

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            let errors = figment_to_config_errors(e);
            render_errors(&errors);
            return Err(TelexportError::Validation(
                "configuration failed to load".into(),
            ));
        }
    };

    if let Err(errors) = validate_config(&config) {
        render_errors(&errors);
        return Err(TelexportError::Validation(
            "configuration failed validation".into(),
        ));
    }

    Ok(config)
}

/// Initialize the tracing subscriber from the configured level.
///
/// `RUST_LOG` still wins when set, so operators can raise verbosity per
/// module without touching config.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("telexport={log_level},info")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a token that is cancelled when either signal is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Runs the `telexport serve` command.
pub async fn run_serve(config_path: Option<PathBuf>) -> Result<(), TelexportError> {
    let config = load_validated_config(config_path.as_deref())?;
    init_tracing(&config.server.log_level);

    info!("starting telexport serve");

    let (Some(api_id), Some(api_hash)) = (config.telegram.api_id, config.telegram.api_hash.clone())
    else {
        eprintln!(
            "error: Telegram API credentials required. Set telegram.api_id and \
             telegram.api_hash in telexport.toml (or TELEXPORT_TELEGRAM_* env vars)."
        );
        return Err(TelexportError::Validation(
            "telegram.api_id and telegram.api_hash are required for serve".into(),
        ));
    };

    let shutdown = install_signal_handler();

    // Artifact store + background sweeper.
    let store = Arc::new(
        ArtifactStore::open(
            &config.export.dir,
            Duration::from_secs(config.export.ttl_hours * 3600),
        )
        .await?,
    );
    let sweeper = store.spawn_sweeper(
        Duration::from_secs(config.export.sweep_interval_secs),
        shutdown.clone(),
    );

    // Live MTProto provider over the persisted session.
    let provider = Arc::new(
        TelegramProvider::connect(TelegramProviderConfig {
            api_id,
            api_hash,
            session_path: PathBuf::from(&config.telegram.session_path),
        })
        .await
        .inspect_err(|_| {
            eprintln!(
                "error: could not establish an authorized Telegram session. \
                 Check telegram.session_path and authorize the session first."
            );
        })?,
    );

    let wait = WaitController::new(WaitPolicy {
        wait_budget: Duration::from_secs(config.retry.wait_budget_seconds),
        max_attempts: config.retry.max_attempts,
        base_backoff: Duration::from_millis(config.retry.base_backoff_ms),
        jitter_ratio: config.retry.jitter_ratio,
        request_timeout: Duration::from_secs(config.retry.request_timeout_seconds),
    });

    let resolver = Arc::new(ChatResolver::new(
        provider.clone(),
        wait.clone(),
        ResolverConfig {
            cache_enabled: config.history.resolver_cache_enabled,
            cache_size: config.history.resolver_cache_size,
        },
    ));

    let fetcher = Arc::new(HistoryFetcher::new(
        provider.clone(),
        wait,
        store.clone(),
        FetcherConfig {
            max_page_size: config.history.max_page_size,
            inner_read_multiplier: config.history.inner_read_multiplier,
            scan_budget_batches: config.history.scan_budget_batches,
            export_threshold: config.history.export_threshold,
            max_export_messages: config.history.max_export_messages,
        },
    ));

    let toolkit = Arc::new(Toolkit::new(
        resolver,
        fetcher,
        ToolkitConfig {
            max_page_size: config.history.max_page_size,
            ..ToolkitConfig::default()
        },
    ));

    let state = GatewayState {
        toolkit,
        store,
        auth: AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        },
    };

    telexport_gateway::start_server(
        &ServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
        },
        state,
        shutdown.clone(),
    )
    .await?;

    // Persist session updates (server salts, DC migrations) on the way out.
    if let Err(e) = provider.save_session() {
        tracing::warn!(error = %e, "failed to persist telegram session");
    }

    sweeper.abort();
    info!("telexport serve stopped");
    Ok(())
}

/// Runs the `telexport check` command: load, validate, print.
pub fn run_check(config_path: Option<PathBuf>) -> Result<(), TelexportError> {
    let mut config = load_validated_config(config_path.as_deref())?;

    // Never print secrets.
    if config.server.bearer_token.is_some() {
        config.server.bearer_token = Some("[redacted]".into());
    }
    if config.telegram.api_hash.is_some() {
        config.telegram.api_hash = Some("[redacted]".into());
    }

    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| TelexportError::Internal(format!("config rendering failed: {e}")))?;
    println!("{rendered}");
    println!("configuration OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_fails_cleanly() {
        let result = load_validated_config(Some(Path::new("/nonexistent/telexport.toml")));
        // Figment treats a missing file as empty, so this resolves to
        // defaults rather than an error.
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn signal_handler_returns_live_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }
}
