//! Per-channel pixel buffers owned by the render loop

use crate::color::Rgb;
use crate::error::{CoreError, Result};
use crate::frame::Frame;
use crate::routing::UniverseRoute;

/// Pixels of one physical output channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBuffer {
    pixels: Vec<Rgb>,
    active: usize,
}

impl ChannelBuffer {
    /// Allocate a buffer for `leds` LEDs, all black
    pub fn new(leds: usize) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; leds],
            active: leds,
        }
    }

    /// Allocated LED count
    pub fn led_count(&self) -> usize {
        self.pixels.len()
    }

    /// Number of LEDs transmitted each cycle
    pub fn active_leds(&self) -> usize {
        self.active
    }

    /// Limit transmission to the first `leds` LEDs (clamped to the allocation)
    pub fn set_active_leds(&mut self, leds: usize) {
        self.active = leds.min(self.pixels.len());
    }

    /// All allocated pixels
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Pixels that are transmitted
    pub fn active_pixels(&self) -> &[Rgb] {
        &self.pixels[..self.active]
    }

    /// Set every pixel to black
    pub fn clear(&mut self) {
        self.pixels.fill(Rgb::BLACK);
    }
}

/// The set of output channel buffers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelBuffers {
    channels: Vec<ChannelBuffer>,
}

impl ChannelBuffers {
    /// Allocate one buffer per entry of `led_counts`
    pub fn new(led_counts: &[usize]) -> Self {
        Self {
            channels: led_counts.iter().map(|&leds| ChannelBuffer::new(leds)).collect(),
        }
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if no channel is configured
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Get a channel buffer
    pub fn get(&self, channel: usize) -> Option<&ChannelBuffer> {
        self.channels.get(channel)
    }

    /// Get a mutable channel buffer
    pub fn get_mut(&mut self, channel: usize) -> Option<&mut ChannelBuffer> {
        self.channels.get_mut(channel)
    }

    /// Iterate channel buffers in channel order
    pub fn iter(&self) -> std::slice::Iter<'_, ChannelBuffer> {
        self.channels.iter()
    }

    /// Mutable iterator over channels
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ChannelBuffer> {
        self.channels.iter_mut()
    }

    /// Write one pixel.
    ///
    /// Out of range writes are skipped and reported.
    pub fn write_pixel(&mut self, channel: usize, index: usize, pixel: Rgb) -> Result<()> {
        let count = self.channels.len();
        let Some(buffer) = self.channels.get_mut(channel) else {
            let err = CoreError::ChannelOutOfRange { channel, count };
            tracing::error!("write_pixel skipped: {}", err);
            return Err(err);
        };
        let leds = buffer.pixels.len();
        let Some(slot) = buffer.pixels.get_mut(index) else {
            let err = CoreError::PixelOutOfRange {
                channel,
                index,
                leds,
            };
            tracing::error!("write_pixel skipped: {}", err);
            return Err(err);
        };
        *slot = pixel;
        Ok(())
    }

    /// Write a run of pixels starting at `start`.
    ///
    /// Pixels that would fall past the channel end are dropped and the first
    /// offending index is reported once. Returns the number of pixels written.
    pub fn write_run<I>(&mut self, channel: usize, start: usize, pixels: I) -> usize
    where
        I: IntoIterator<Item = Rgb>,
    {
        let count = self.channels.len();
        let Some(buffer) = self.channels.get_mut(channel) else {
            tracing::error!(
                "{}",
                CoreError::ChannelOutOfRange { channel, count }
            );
            return 0;
        };

        let leds = buffer.pixels.len();
        let mut written = 0;
        for (i, pixel) in pixels.into_iter().enumerate() {
            let index = start + i;
            match buffer.pixels.get_mut(index) {
                Some(slot) => {
                    *slot = pixel;
                    written += 1;
                }
                None => {
                    tracing::error!(
                        "{}",
                        CoreError::PixelOutOfRange {
                            channel,
                            index,
                            leds
                        }
                    );
                    break;
                }
            }
        }
        written
    }

    /// Copy a routed universe's pixels into its channel
    pub fn merge_frame(&mut self, route: UniverseRoute, frame: &Frame) -> usize {
        self.write_run(route.channel, route.pixel_offset, frame.pixels())
    }

    /// Black out every channel
    pub fn clear(&mut self) {
        for buffer in &mut self.channels {
            buffer.clear();
        }
    }
}
