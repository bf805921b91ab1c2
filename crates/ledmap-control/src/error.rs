//! Error types for the network input side
use thiserror::Error;

/// Control system errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// ArtNet Dmx payload outside `(0, 512]` bytes
    #[error("ArtDMX frame with {size} data bytes dropped on universe {universe}")]
    DmxSize {
        /// Universe named by the packet
        universe: u16,
        /// Computed payload size, negative when the packet is shorter than the header
        size: isize,
    },

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the routing core
    #[error(transparent)]
    Core(#[from] ledmap_core::CoreError),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Thread could not be started
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name
        name: String,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dmx_size_names_universe() {
        let err = ControlError::DmxSize {
            universe: 513,
            size: 600,
        };
        assert!(err.to_string().contains("universe 513"));
    }
}
