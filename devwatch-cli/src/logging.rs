//! Tracing subscriber setup
//!
//! Three outputs share one registry: stderr (filtered by `RUST_LOG`, or
//! `-v`), an append-only log file for INFO and above, and the chat layer
//! for WARN and above.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Context;
use devwatch_core::ChatLogLayer;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Keeps the background file writer alive; drop it last to flush
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber
pub fn init(verbose: bool, log_file: Option<&Path>, chat: ChatLogLayer) -> anyhow::Result<LogGuard> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let stderr_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let (file_layer, file_guard) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(LevelFilter::INFO);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(stderr_filter))
        .with(file_layer)
        .with(chat.with_filter(LevelFilter::WARN))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: file_guard })
}
