//! Tracing subscriber setup.
//!
//! Both sinks go through `tracing_appender::non_blocking` so the render and
//! input threads never wait on a slow terminal or disk. Events carry the
//! emitting thread's name (`render`, `input`, `strip-type`).

use anyhow::{Context, Result};
use ledmap_core::{LogConfig, LOG_FILE_PREFIX};
use std::fs::File;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Keeps the log writer threads alive; dropping it flushes pending events
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Build the filter: `RUST_LOG` directives if set, the configured level if not
pub fn build_filter(level: Level, env: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(env.unwrap_or_default())
}

/// Install the global subscriber
pub fn init(config: &LogConfig) -> Result<Option<LogGuard>> {
    config
        .ensure_log_directory()
        .context("Failed to create log directory")?;

    match config.cleanup_old_logs() {
        Ok(0) => {}
        Ok(removed) => eprintln!("Removed {} old {} log files", removed, LOG_FILE_PREFIX),
        Err(e) => eprintln!("Warning: Failed to clean up old log files: {}", e),
    }

    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config.parse_level(), env.as_deref());
    let mut guards = Vec::new();

    let console_layer = if config.console_output {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
        guards.push(guard);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(true)
                .with_target(false)
                .with_thread_names(true)
                .with_filter(filter.clone()),
        )
    } else {
        None
    };

    let file_layer = if config.file_output {
        let log_path = config.current_log_path();
        let file = File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        guards.push(guard);
        eprintln!("Logging to file: {:?}", log_path);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .with_filter(filter),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized at level: {}", config.parse_level());
    Ok((!guards.is_empty()).then_some(LogGuard { _guards: guards }))
}
