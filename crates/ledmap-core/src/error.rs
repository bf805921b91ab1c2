//! Error types for the pixel routing core

use thiserror::Error;

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Write to an output channel that is not configured
    #[error("Channel {channel} out of range ({count} channels configured)")]
    ChannelOutOfRange {
        /// Requested channel index
        channel: usize,
        /// Number of configured channels
        count: usize,
    },

    /// Write to a pixel past the channel's allocated LED count
    #[error("Pixel {index} out of range on channel {channel} ({leds} LEDs allocated)")]
    PixelOutOfRange {
        /// Channel index
        channel: usize,
        /// Requested pixel index
        index: usize,
        /// Allocated LED count of the channel
        leds: usize,
    },

    /// Unknown LED chip name
    #[error("Unknown LED chip type: {0}")]
    UnknownChip(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Hardware output collaborator failure
    #[error("Output error: {0}")]
    Output(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
