//! Running application state.

use std::path::PathBuf;
use std::thread::JoinHandle;

use ledmap_control::{InputThread, Producer};
use ledmap_core::{AppConfig, InputConfig, RoutingTable, ShutdownToken};

/// Startup choices made on the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// File re-read on `SIGHUP`
    pub config_path: Option<PathBuf>,
    /// Record output instead of driving hardware
    pub dry_run: bool,
}

/// The running pipeline: input, strip-type and render threads plus the
/// channels used to reconfigure them.
pub struct App {
    /// Configuration currently applied
    pub(crate) config: AppConfig,
    pub(crate) options: RunOptions,
    pub(crate) shutdown: ShutdownToken,
    pub(crate) input_config_tx: Producer<InputConfig>,
    pub(crate) routing_tx: Producer<RoutingTable>,
    pub(crate) input: InputThread,
    pub(crate) workers: Vec<JoinHandle<()>>,
}

impl App {
    /// Configuration currently applied
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Token observed by every worker loop
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }
}
