//! Cross-thread run state: the shutdown token and the output mode flag

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::chip::ChipType;

/// Cooperative cancellation shared by every worker loop.
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    running: Arc<AtomicBool>,
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownToken {
    /// Create a token in the running state
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Check if loops should keep going
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every loop to exit
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Selected chip family, written by the strip-type listener and read by the
/// render loop once per cycle.
#[derive(Debug, Clone)]
pub struct OutputModeFlag {
    mode: Arc<AtomicU8>,
}

impl OutputModeFlag {
    /// Create a flag holding `chip`
    pub fn new(chip: ChipType) -> Self {
        Self {
            mode: Arc::new(AtomicU8::new(chip.to_u8())),
        }
    }

    /// Publish a new chip family
    pub fn store(&self, chip: ChipType) {
        self.mode.store(chip.to_u8(), Ordering::Release);
    }

    /// Read the current chip family
    pub fn load(&self) -> ChipType {
        // Only valid tags are ever stored
        ChipType::from_u8(self.mode.load(Ordering::Acquire)).unwrap_or_default()
    }
}
