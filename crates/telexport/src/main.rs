// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telexport - read-only history export server for public Telegram chats.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod serve;

/// Telexport - read-only history export server for public Telegram chats.
#[derive(Parser, Debug)]
#[command(name = "telexport", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Telexport tool server.
    Serve {
        /// Path to a telexport.toml; defaults to the XDG hierarchy.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Load, validate, and print the effective configuration.
    Check {
        /// Path to a telexport.toml; defaults to the XDG hierarchy.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config } => serve::run_serve(config).await,
        Commands::Check { config } => serve::run_check(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
