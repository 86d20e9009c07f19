//! coursekit - a command line client for the course platform.
//!
//! Every run restores the persisted session first, then executes one
//! command against it.

mod cli;
mod commands;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use coursekit_core::{ApiClient, AuthContext, Config, SessionController};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use commands::App;

// ============================================================================
// Constants
// ============================================================================

/// Log file written in the data directory
const LOG_FILE: &str = "coursekit.log";

/// Initialize the tracing subscriber for logging.
///
/// Use the RUST_LOG env var to control the level (e.g. RUST_LOG=debug).
/// When `log_dir` is usable, the same events are also appended to a file
/// there; the returned guard must live until exit to flush it.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {:#}. Using default configuration.", e);
            let mut config = Config::default();
            config.apply_env();
            config
        }
    };
    if let Some(url) = cli.api_url.clone() {
        config.api_base_url = url;
    }

    let data_dir = config.data_dir().ok();
    let _log_guard = init_tracing(data_dir.as_deref());
    info!(api = %config.api_base_url, "coursekit starting");

    let storage = config
        .refresh_storage()
        .context("Failed to open refresh token storage")?;
    let auth = AuthContext::new(storage);
    let api = ApiClient::from_config(&config, auth).context("Failed to build HTTP client")?;
    let session = SessionController::new(api);

    let state = session.bootstrap().await;
    if let Some(ref user) = state.user {
        info!(username = %user.username, "Resumed session");
    }

    let mut app = App { config, session };
    if let Err(e) = app.run(cli.command).await {
        warn!(error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}
