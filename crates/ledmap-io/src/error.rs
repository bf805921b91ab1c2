//! Error types for device and socket access.

use std::path::PathBuf;

/// Result type alias for device I/O operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Error type for device and socket access.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Device node could not be opened or configured
    #[error("Device {path:?}: {source}")]
    Device {
        /// Device path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// UDP socket could not be bound
    #[error("Failed to bind UDP port {port}: {source}")]
    Bind {
        /// Port number
        port: u16,
        /// Underlying error
        source: std::io::Error,
    },

    /// GPIO pin access failed
    #[error("GPIO {pin}: {source}")]
    Gpio {
        /// Pin number
        pin: u32,
        /// Underlying error
        source: std::io::Error,
    },

    /// System call failed (ioctl, getifaddrs)
    #[error("System call failed: {0}")]
    Os(#[from] nix::Error),

    /// No usable network interface
    #[error("No IPv4 network interface found")]
    NoInterface,

    /// Requested output is not available
    #[error("Output not available: {0}")]
    NotAvailable(String),
}

impl From<IoError> for ledmap_core::CoreError {
    fn from(e: IoError) -> Self {
        ledmap_core::CoreError::Output(e.to_string())
    }
}
