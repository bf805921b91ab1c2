//! Collaborator interfaces at the OS boundary
//!
//! The input and render loops only talk to sockets and LED hardware through
//! these traits, so the whole pipeline can be driven by in-memory doubles.

use std::io;
use std::net::SocketAddr;

use crate::chip::{ChipType, ChipWireBuffer};
use crate::error::Result;

/// A bound, non-blocking datagram endpoint
pub trait DatagramSocket: Send {
    /// Receive one datagram.
    ///
    /// Returns `Ok(None)` when nothing is pending.
    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>>;

    /// Send one datagram
    fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// Local address the socket is bound to
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// LED hardware driven by the render loop
pub trait HardwareOutput: Send {
    /// Render every channel on the single-wire driver.
    ///
    /// A failure aborts the current render cycle.
    fn render_single_wire(&mut self, channels: &[ChipWireBuffer]) -> Result<()>;

    /// Send one channel's encoded SPI stream, returning bytes written
    fn send_spi_channel(&mut self, channel: usize, wire: &[u8]) -> Result<usize>;

    /// Route the shield's outputs for a chip family
    fn switch_output_route(&mut self, chip: ChipType) -> Result<()>;
}
