//! LedMap Core - pixel routing domain
//!
//! This crate holds everything the network and render threads share that
//! does no I/O of its own:
//! - Universe frames and RGB pixels
//! - Universe to channel routing
//! - Per-channel pixel buffers
//! - Chip wire encoders with gamma correction
//! - Configuration, logging settings, frame pacing and run state
//! - The socket and hardware collaborator traits

#![warn(missing_docs)]

pub mod channel;
pub mod chip;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod lifecycle;
pub mod logging;
pub mod ports;
pub mod routing;
pub mod timing;

// --- Re-exports grouped by category ---

// Frames & Pixels
pub use color::{GammaTable, Rgb};
pub use frame::{
    Frame, DMX_UNIVERSE_SIZE, MAX_CHANNELS_IN, MAX_OUTPUT_CHANNELS, MAX_UNIVERSES_PER_OUTPUT,
    PIXELS_PER_UNIVERSE,
};

// Routing & Buffers
pub use channel::{ChannelBuffer, ChannelBuffers};
pub use routing::{RoutingTable, UniverseRoute};

// Encoding
pub use chip::{ChipEncoder, ChipType, ChipWireBuffer};

// Configuration
pub use config::{
    AppConfig, ChannelSettings, GammaSettings, GpioSettings, InputConfig, InputMode,
    InputSettings, OutputSettings,
};
pub use logging::{LogConfig, LOG_FILE_PREFIX};

// Runtime
pub use error::{CoreError, Result};
pub use lifecycle::{OutputModeFlag, ShutdownToken};
pub use ports::{DatagramSocket, HardwareOutput};
pub use timing::{FramePacer, Pace};
