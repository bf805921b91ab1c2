//! LM protocol parsing
//!
//! Wire layout of one datagram:
//!
//! ```text
//! [u16 LE leds ch0][u16 LE leds ch1]...[0xFF 0xFF]?[R G B][R G B]...
//! ```
//!
//! Channels are filled in header order, each consuming its LED count of
//! consecutive pixels. Only the first `MAX_OUTPUT_CHANNELS` header entries
//! produce output.

use ledmap_core::{Rgb, MAX_OUTPUT_CHANNELS};

/// Datagrams of this size or less are not parsed
pub const LM_MIN_PAYLOAD: usize = 4;
/// Largest LM datagram
pub const LM_MAX_PAYLOAD: usize = 12288;

const TERMINATOR: [u8; 2] = [0xFF, 0xFF];

/// One parsed LM datagram, borrowing the received bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LmPacket<'a> {
    header: &'a [u8],
    pixels: &'a [u8],
}

/// Pixels destined for one output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRun<'a> {
    /// Output channel index
    pub channel: usize,
    /// LED count requested by the header
    pub requested: usize,
    /// RGB bytes available for the channel (may be shorter than requested)
    pub data: &'a [u8],
}

impl ChannelRun<'_> {
    /// Pixels available for the channel
    pub fn pixels(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.data
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
    }

    /// Number of available pixels
    pub fn len(&self) -> usize {
        self.data.len() / 3
    }

    /// Check if the channel received no pixels
    pub fn is_empty(&self) -> bool {
        self.data.len() < 3
    }
}

impl<'a> LmPacket<'a> {
    /// Parse a datagram.
    ///
    /// Returns `None` for payloads of 4 bytes or less. The header ends at the
    /// first `0xFF 0xFF` pair or when fewer than two bytes remain.
    pub fn parse(buf: &'a [u8]) -> Option<Self> {
        let n = buf.len();
        if n <= LM_MIN_PAYLOAD {
            return None;
        }

        let mut pos = 0;
        while pos + 1 < n && buf[pos..pos + 2] != TERMINATOR {
            pos += 2;
        }

        // The terminator slot is counted whether or not it was present
        let header = &buf[..pos];
        let offset = (pos + 2).min(n);
        let body = &buf[offset..];
        let total_pixels = body.len() / 3;

        Some(Self {
            header,
            pixels: &body[..total_pixels * 3],
        })
    }

    /// Number of header entries, including those past the channel cap
    pub fn channel_count(&self) -> usize {
        self.header.len() / 2
    }

    /// LED counts in header order
    pub fn led_counts(&self) -> impl Iterator<Item = u16> + 'a {
        let header = self.header;
        header
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
    }

    /// Pixel triples carried by the datagram
    pub fn total_pixels(&self) -> usize {
        self.pixels.len() / 3
    }

    /// Raw pixel bytes
    pub fn pixel_data(&self) -> &'a [u8] {
        self.pixels
    }

    /// Per-channel pixel runs for the channels that produce output.
    ///
    /// The pixel cursor advances by every header entry's LED count; a run is
    /// cut short when the datagram runs out of pixels.
    pub fn channel_runs(&self) -> impl Iterator<Item = ChannelRun<'a>> + 'a {
        let pixels = self.pixels;
        let total = pixels.len() / 3;
        self.led_counts()
            .take(MAX_OUTPUT_CHANNELS)
            .enumerate()
            .scan(0usize, move |cursor, (channel, leds)| {
                let requested = leds as usize;
                let start = (*cursor).min(total);
                let end = (*cursor + requested).min(total);
                *cursor += requested;
                Some(ChannelRun {
                    channel,
                    requested,
                    data: &pixels[start * 3..end * 3],
                })
            })
    }
}
