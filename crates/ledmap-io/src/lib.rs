//! LedMap IO - OS and device access
//!
//! Thin wrappers the binary wires into the pipeline:
//! - Non-blocking UDP endpoints
//! - spidev, the single-wire driver node and the sysfs GPIO multiplexer
//! - Host network identity for ArtNet discovery
//! - `HardwareOutput` implementations for the shield and for dry runs

#![warn(missing_docs)]

pub mod error;
pub mod gpio;
pub mod hardware;
pub mod netinfo;
pub mod single_wire;
pub mod spi;
pub mod udp;

pub use error::{IoError, Result};
pub use gpio::{GpioPin, RouteSwitcher};
pub use hardware::{DryRunOutput, DryRunRecord, LinuxOutput};
pub use netinfo::HostInfo;
pub use single_wire::SingleWireDevice;
pub use spi::SpiDevice;
pub use udp::UdpEndpoint;
