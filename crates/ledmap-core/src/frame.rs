//! DMX universe frames
//!
//! A [`Frame`] is one universe worth of channel data. Frames are plain values
//! with an inline 512-byte payload so they can move through the bounded frame
//! queue without touching the heap.

use crate::color::Rgb;

/// Number of DMX channels (bytes) in one universe
pub const DMX_UNIVERSE_SIZE: usize = 512;

/// Whole RGB pixels carried by one universe.
///
/// `512 / 3` leaves a two byte tail which is never read as a pixel.
pub const PIXELS_PER_UNIVERSE: usize = 170;

/// Upper bound on universes accepted per input poll cycle
pub const MAX_CHANNELS_IN: usize = 12;

/// Number of physical output channels on the LED shield
pub const MAX_OUTPUT_CHANNELS: usize = 2;

/// Universes that fit on one output channel
pub const MAX_UNIVERSES_PER_OUTPUT: usize = MAX_CHANNELS_IN / MAX_OUTPUT_CHANNELS;

/// One universe of channel data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// 15-bit ArtNet port address (`Net << 8 | SubUni`)
    pub universe: u16,
    /// Channel values, zero padded past the received length
    pub data: [u8; DMX_UNIVERSE_SIZE],
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            universe: 0,
            data: [0; DMX_UNIVERSE_SIZE],
        }
    }
}

impl Frame {
    /// Create a blank frame for a universe
    pub fn new(universe: u16) -> Self {
        Self {
            universe,
            ..Self::default()
        }
    }

    /// Overwrite this frame in place.
    ///
    /// Copies at most 512 bytes of `data` and zero fills the rest so a short
    /// payload never leaves stale channel values behind.
    pub fn fill_from(&mut self, universe: u16, data: &[u8]) {
        self.universe = universe;
        let len = data.len().min(DMX_UNIVERSE_SIZE);
        self.data[..len].copy_from_slice(&data[..len]);
        self.data[len..].fill(0);
    }

    /// Iterate the whole RGB triples of the payload
    pub fn pixels(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.data[..PIXELS_PER_UNIVERSE * 3]
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
    }
}
