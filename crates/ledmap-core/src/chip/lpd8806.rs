//! LPD8806 encoding
//!
//! Three bytes per LED in G, R, B order, each `0x80 | (c >> 1)`, followed by
//! `(leds + 31) / 32` zero latch bytes.

use crate::color::Rgb;

/// Number of zero latch bytes after `leds` LEDs
pub fn latch_len(leds: usize) -> usize {
    leds.div_ceil(32)
}

/// Wire size in bytes for `leds` LEDs
pub fn wire_len(leds: usize) -> usize {
    leds * 3 + latch_len(leds)
}

#[inline]
fn seven_bit(c: u8) -> u8 {
    0x80 | (c >> 1)
}

/// Encode pixels followed by the latch
pub fn encode<I>(pixels: I, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = Rgb>,
{
    out.clear();
    let mut leds = 0;
    for p in pixels {
        out.extend_from_slice(&[seven_bit(p.g), seven_bit(p.r), seven_bit(p.b)]);
        leds += 1;
    }
    out.resize(out.len() + latch_len(leds), 0);
}
