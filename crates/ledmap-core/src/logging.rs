//! Logging configuration
//!
//! The subscriber itself is installed by the binary; this module only holds
//! the serializable settings and the log file housekeeping.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::Level;

/// File name prefix for log files
pub const LOG_FILE_PREFIX: &str = "ledmap";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level (`trace`, `debug`, `info`, `warn`, `error`)
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a timestamped file in `log_dir`
    pub file_output: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Number of log files kept by [`LogConfig::cleanup_old_logs`]
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            max_files: 10,
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO
    pub fn parse_level(&self) -> Level {
        self.level.trim().parse().unwrap_or(Level::INFO)
    }

    /// Create the log directory if file output is enabled
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Path of the log file for this process.
    ///
    /// The timestamp is taken on first call so repeated calls agree.
    pub fn current_log_path(&self) -> PathBuf {
        static STARTED: OnceLock<String> = OnceLock::new();
        let stamp =
            STARTED.get_or_init(|| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
        self.log_dir
            .join(format!("{}_{}.log", LOG_FILE_PREFIX, stamp))
    }

    /// Delete the oldest log files so at most `max_files - 1` remain,
    /// leaving room for the file about to be created.
    ///
    /// Returns the number of files removed.
    pub fn cleanup_old_logs(&self) -> std::io::Result<usize> {
        if !self.log_dir.exists() {
            return Ok(0);
        }

        let mut logs = list_logs(&self.log_dir)?;
        let keep = self.max_files.saturating_sub(1);
        if logs.len() <= keep {
            return Ok(0);
        }

        // Timestamped names sort chronologically
        logs.sort();
        let excess = logs.len() - keep;
        for path in &logs[..excess] {
            tracing::debug!("Removing old log file {:?}", path);
            fs::remove_file(path)?;
        }
        Ok(excess)
    }
}

fn list_logs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut logs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(".log"));
        if is_log && path.is_file() {
            logs.push(path);
        }
    }
    Ok(logs)
}
