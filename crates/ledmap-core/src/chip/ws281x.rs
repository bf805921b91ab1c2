//! Single-wire (WS281x) encoding
//!
//! One `0x00RRGGBB` word per LED with no framing. Pulse timing is handled by
//! the single-wire driver.

use crate::color::Rgb;

/// Encode pixels as packed words
pub fn encode<I>(pixels: I, out: &mut Vec<u32>)
where
    I: IntoIterator<Item = Rgb>,
{
    out.clear();
    out.extend(pixels.into_iter().map(Rgb::to_u32));
}
